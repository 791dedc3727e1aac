//! # headswap-core
//!
//! Core types for the headswap pipeline.
//!
//! This crate provides:
//! - The error taxonomy shared by every stage
//! - ONNX Runtime session pooling behind the [`core::InferenceEngine`] trait
//! - Domain types passed between stages (images, transforms, coefficients, masks)
//! - Image, tensor and geometric utilities
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, constants, validation and inference
//! * [`domain`] - Stage data types
//! * [`utils`] - Image IO, tensor conversion and affine warping

pub mod core;
pub mod domain;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{
        ErrorCategory, ImageRole, InferenceEngine, OrtInfer, ProcessingStage, SwapError,
        SwapResult, TensorInput,
    };
    pub use crate::domain::{
        AlignedFace, AlignmentTransform, FaceDetection, FaceRegion, GeometryParameters,
        ModelKind, ParameterLayout, RawImage, SegmentationMask,
    };
    pub use crate::utils::{OutputFormat, decode_image, encode_image};
}
