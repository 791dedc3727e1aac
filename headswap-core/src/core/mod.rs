//! Core building blocks: errors, configuration, constants and inference.

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod validation;

pub use errors::{ErrorCategory, ImageRole, ProcessingStage, SimpleError, SwapError, SwapResult};
pub use inference::{InferenceEngine, OrtInfer, TensorInput};
