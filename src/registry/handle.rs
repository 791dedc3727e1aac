//! Shared handle to one loaded model.

use headswap_core::core::{InferenceEngine, SwapResult, TensorInput};
use headswap_core::domain::ModelKind;
use ndarray::ArrayD;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Cheap-to-clone reference to a loaded model.
///
/// Handles are read-only; every request clones the ones it needs.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    kind: ModelKind,
    engine: Arc<dyn InferenceEngine>,
}

impl ModelHandle {
    pub fn new(kind: ModelKind, engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            inner: Arc::new(HandleInner { kind, engine }),
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.inner.kind
    }

    /// Name reported by the engine.
    pub fn name(&self) -> &str {
        self.inner.engine.model_name()
    }

    /// Runs one forward pass, logging shape and latency.
    pub fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>> {
        let start = Instant::now();
        let result = self.inner.engine.infer(inputs);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(output) => debug!(
                model = %self.inner.kind,
                output_shape = ?output.shape(),
                elapsed_ms,
                "inference complete"
            ),
            Err(err) => error!(model = %self.inner.kind, elapsed_ms, error = %err, "inference failed"),
        }
        result
    }

    pub(crate) fn release(&self) {
        self.inner.engine.release();
    }

    /// Number of live clones of this handle, including `self`.
    pub(crate) fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
