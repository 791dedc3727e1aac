//! ONNX Runtime inference engine with a round-robin session pool.

use crate::core::errors::SwapError;
use crate::domain::ModelKind;
use ort::session::Session;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;

#[path = "ort_infer_builders.rs"]
mod ort_infer_builders;
#[path = "ort_infer_execution.rs"]
mod ort_infer_execution;
#[cfg(test)]
#[path = "ort_infer_tests.rs"]
mod ort_infer_tests;

/// A pool of ONNX Runtime sessions for one model.
///
/// `Session::run` needs exclusive access, so concurrent callers are spread
/// over `sessions` round-robin. A slot holding `None` has been released.
pub struct OrtInfer {
    pub(super) sessions: Vec<Mutex<Option<Session>>>,
    pub(super) next_idx: AtomicUsize,
    pub(super) input_names: Vec<String>,
    pub(super) output_name: String,
    pub(super) model_path: PathBuf,
    pub(super) model_name: String,
    pub(super) kind: ModelKind,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("kind", &self.kind)
            .field("sessions", &self.sessions.len())
            .field("input_names", &self.input_names)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    /// Returns the model kind this engine was loaded for.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Input tensor names, in binding order.
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    /// Number of sessions in the pool.
    pub fn pool_size(&self) -> usize {
        self.sessions.len()
    }

    /// Number of sessions that have not been released.
    pub fn live_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|slot| slot.lock().map(|guard| guard.is_some()).unwrap_or(false))
            .count()
    }

    pub(super) fn released_error(&self) -> SwapError {
        SwapError::model_execution(
            &self.model_name,
            "session acquisition",
            crate::core::errors::SimpleError::new("session has been released"),
        )
    }
}
