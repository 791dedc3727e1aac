//! Process-level helpers.
//!
//! Image and tensor utilities live in `headswap_core::utils`; this module only
//! holds what a binary needs at startup.

/// Initializes the tracing subscriber for logging.
///
/// Installs an `EnvFilter` read from `RUST_LOG` and the fmt layer. Call once at
/// the start of an application.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
