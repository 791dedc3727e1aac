//! Loading, validating and releasing the five pipeline models.
//!
//! The registry is built once at startup and shared by every request through
//! `Arc`. It is never a hidden global: callers that want run-once
//! initialisation use [`RegistryCell`].

pub(crate) mod canary;
mod cell;
mod handle;

pub use cell::RegistryCell;
pub use handle::ModelHandle;

use crate::config::{PipelineConfig, RegistryConfig};
use headswap_core::core::{InferenceEngine, OrtInfer, SimpleError, SwapError, SwapResult};
use headswap_core::domain::ModelKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Summary returned by [`ModelRegistry::shutdown`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShutdownReport {
    /// Models whose sessions were released, in release order.
    pub released: Vec<ModelKind>,
    /// Handles still held elsewhere at shutdown; they fail on next use.
    pub outstanding_handles: usize,
    /// Time spent releasing.
    pub elapsed: Duration,
}

/// The five loaded models.
#[derive(Debug)]
pub struct ModelRegistry {
    handles: Vec<ModelHandle>,
    config: PipelineConfig,
    shut_down: AtomicBool,
}

impl ModelRegistry {
    /// Loads every model listed in `config` and runs its canary.
    ///
    /// # Errors
    ///
    /// Returns [`SwapError::Config`] for an invalid configuration and
    /// [`SwapError::ModelLoad`] naming the first model that is missing, fails
    /// to load or fails its canary.
    pub fn load(config: &RegistryConfig) -> SwapResult<Self> {
        config.validate()?;
        let start = Instant::now();
        let mut handles = Vec::with_capacity(ModelKind::ALL.len());
        for kind in ModelKind::ALL {
            let path = &config.source(kind).path;
            let engine = OrtInfer::from_config(kind, &config.inference_config(kind), path)?;
            let handle = ModelHandle::new(kind, Arc::new(engine));
            Self::validate_handle(&handle, path.clone(), &config.pipeline)?;
            info!(model = %kind, path = %path.display(), "model loaded");
            handles.push(handle);
        }
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            pool_size = config.session_pool_size,
            "model registry ready"
        );
        Ok(Self {
            handles,
            config: config.pipeline.clone(),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Builds a registry from caller-supplied engines, one per model kind.
    ///
    /// Engines go through the same canary as weights loaded from disk.
    pub fn from_engines<I>(engines: I, config: &PipelineConfig) -> SwapResult<Self>
    where
        I: IntoIterator<Item = (ModelKind, Arc<dyn InferenceEngine>)>,
    {
        config.validate()?;
        let mut slots: Vec<Option<ModelHandle>> = vec![None; ModelKind::ALL.len()];
        for (kind, engine) in engines {
            let slot = &mut slots[kind.index()];
            if slot.is_some() {
                return Err(SwapError::config_error(format!(
                    "more than one engine supplied for the {kind} model"
                )));
            }
            *slot = Some(ModelHandle::new(kind, engine));
        }

        let mut handles = Vec::with_capacity(slots.len());
        for (kind, slot) in ModelKind::ALL.into_iter().zip(slots) {
            let handle = slot.ok_or_else(|| {
                SwapError::model_load(
                    kind,
                    "<in-memory>",
                    "no engine supplied",
                    None::<SimpleError>,
                )
            })?;
            Self::validate_handle(&handle, PathBuf::from("<in-memory>"), config)?;
            handles.push(handle);
        }
        info!("model registry ready (in-memory engines)");
        Ok(Self {
            handles,
            config: config.clone(),
            shut_down: AtomicBool::new(false),
        })
    }

    fn validate_handle(handle: &ModelHandle, path: PathBuf, config: &PipelineConfig) -> SwapResult<()> {
        canary::run(handle, config).map_err(|err| {
            warn!(model = %handle.kind(), error = %err, "canary inference failed");
            SwapError::model_load(handle.kind(), path, "canary inference failed", Some(err))
        })
    }

    /// Handle for `kind`.
    pub fn get(&self, kind: ModelKind) -> ModelHandle {
        self.handles[kind.index()].clone()
    }

    /// Stage parameters the models were validated against.
    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.config
    }

    /// True once [`ModelRegistry::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Releases every session.
    ///
    /// Handles cloned out of the registry keep their engine alive but every
    /// later inference through them fails with a model execution error. Only
    /// the first call releases anything; later calls return an empty report.
    pub fn shutdown(&self) -> ShutdownReport {
        let start = Instant::now();
        if self.shut_down.swap(true, Ordering::AcqRel) {
            debug!("model registry already shut down");
            return ShutdownReport {
                released: Vec::new(),
                outstanding_handles: 0,
                elapsed: start.elapsed(),
            };
        }
        let mut released = Vec::with_capacity(self.handles.len());
        let mut outstanding_handles = 0;
        for handle in &self.handles {
            handle.release();
            outstanding_handles += handle.strong_count().saturating_sub(1);
            released.push(handle.kind());
        }
        let report = ShutdownReport {
            released,
            outstanding_handles,
            elapsed: start.elapsed(),
        };
        info!(
            released = report.released.len(),
            outstanding_handles = report.outstanding_handles,
            "model registry shut down"
        );
        report
    }
}
