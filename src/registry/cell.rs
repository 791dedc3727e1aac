use super::{ModelRegistry, ShutdownReport};
use crate::config::RegistryConfig;
use headswap_core::core::SwapResult;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Run-once guard around a [`ModelRegistry`].
///
/// Concurrent callers of [`RegistryCell::get_or_load`] block until the first
/// load finishes; only one load ever runs to success. A failed load leaves the
/// cell empty so a later call may retry.
#[derive(Debug, Default)]
pub struct RegistryCell {
    cell: OnceCell<Arc<ModelRegistry>>,
}

impl RegistryCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the registry from `config` unless it is already loaded.
    pub fn get_or_load(&self, config: &RegistryConfig) -> SwapResult<Arc<ModelRegistry>> {
        self.get_or_init_with(|| ModelRegistry::load(config))
    }

    /// Like [`RegistryCell::get_or_load`] with a caller-supplied loader.
    pub fn get_or_init_with<F>(&self, load: F) -> SwapResult<Arc<ModelRegistry>>
    where
        F: FnOnce() -> SwapResult<ModelRegistry>,
    {
        self.cell
            .get_or_try_init(|| load().map(Arc::new))
            .map(Arc::clone)
    }

    /// The loaded registry, if any.
    pub fn get(&self) -> Option<Arc<ModelRegistry>> {
        self.cell.get().cloned()
    }

    /// True once a registry has been loaded and until it is shut down.
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some_and(|registry| !registry.is_shut_down())
    }

    /// Shuts down the loaded registry, if any.
    ///
    /// The cell stays occupied afterwards; it will not load again.
    pub fn shutdown(&self) -> Option<ShutdownReport> {
        self.cell.get().map(|registry| registry.shutdown())
    }
}
