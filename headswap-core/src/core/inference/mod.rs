//! Structures and helpers for model inference.
//!
//! Models are opaque numeric functions: named `f32` tensors in, one `f32`
//! tensor out. [`InferenceEngine`] is that boundary. [`OrtInfer`] implements
//! it on top of ONNX Runtime; tests and alternative backends provide their
//! own implementations.

pub mod ort_infer;
pub mod session;

pub use ort_infer::OrtInfer;
pub use session::load_session;

use crate::core::errors::SwapResult;
use ndarray::{ArrayD, ArrayViewD};
use std::fmt::Debug;

/// One named input tensor for an inference call.
#[derive(Debug, Clone)]
pub struct TensorInput<'a> {
    /// Logical input name (e.g. `"image"`, `"coeffs"`).
    pub name: &'a str,
    /// Tensor data.
    pub tensor: ArrayViewD<'a, f32>,
}

impl<'a> TensorInput<'a> {
    /// Creates a named input from any array view.
    pub fn new<D: ndarray::Dimension>(name: &'a str, tensor: ndarray::ArrayView<'a, f32, D>) -> Self {
        Self {
            name,
            tensor: tensor.into_dyn(),
        }
    }
}

/// A loaded model that maps input tensors to one output tensor.
///
/// Implementations must be safe to call from many threads at once and must
/// not change observable behavior after construction.
pub trait InferenceEngine: Send + Sync + Debug {
    /// Name used in logs and errors.
    fn model_name(&self) -> &str;

    /// Runs one forward pass.
    ///
    /// Inputs are bound to the model's inputs in order.
    fn infer(&self, inputs: &[TensorInput<'_>]) -> SwapResult<ArrayD<f32>>;

    /// Releases runtime resources held by the engine.
    ///
    /// After release every call to [`InferenceEngine::infer`] fails. The
    /// default implementation holds nothing and does nothing.
    fn release(&self) {}
}
