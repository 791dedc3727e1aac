//! Configuration types shared by every model wrapper.

pub mod onnx;

pub use onnx::{
    Device, ModelInferenceConfig, OrtExecutionProvider, OrtGraphOptimizationLevel,
    OrtSessionConfig,
};
