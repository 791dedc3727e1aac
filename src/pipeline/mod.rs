//! The swap pipeline.
//!
//! [`InferencePipeline`] drives a request through detection, geometry
//! estimation, rendering, parsing, blending and compositing. Progress is
//! tracked by the explicit [`PipelineState`] machine, and every failure ends in
//! `Failed` with the error's reason code.

mod cancel;
mod executor;
mod options;
mod state;
mod stats;

pub use cancel::CancellationToken;
pub use executor::{InferencePipeline, PipelineOutcome, PipelineReport};
pub use options::SwapOptions;
pub use state::{PipelineEvent, PipelineState};
pub use stats::{PipelineStats, StatsManager};
