//! Error types for the swap pipeline.
//!
//! Every stage returns either a typed value or a [`SwapError`]. Each variant
//! carries a stable reason code ([`SwapError::code`]) and a coarse
//! [`ErrorCategory`] so callers can tell "your photo has no detectable face"
//! apart from "the service is degraded".
//!
//! # Usage
//!
//! ```rust
//! use headswap_core::core::errors::{ErrorCategory, ImageRole, SwapError};
//!
//! let error = SwapError::NoFaceDetected { role: ImageRole::Source };
//! assert_eq!(error.code(), "no_face_source");
//! assert_eq!(error.category(), ErrorCategory::UserInput);
//!
//! let config_error = SwapError::config_error("missing renderer weights");
//! assert_eq!(config_error.code(), "config_error");
//! ```

pub mod constructors;

use crate::domain::ModelKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Convenient result alias for pipeline operations.
pub type SwapResult<T> = Result<T, SwapError>;

/// Which of the two request images a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    /// The image whose identity is transferred.
    Source,
    /// The image providing pose, expression and background.
    Target,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Source => write!(f, "source"),
            ImageRole::Target => write!(f, "target"),
        }
    }
}

/// Stage of the pipeline an error or a cancellation is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStage {
    /// Decoding request bytes into pixels.
    Decode,
    /// Face detection and alignment.
    Alignment,
    /// 3DMM coefficient estimation.
    GeometryEstimation,
    /// Re-rendering with source identity.
    Rendering,
    /// Face parsing.
    Segmentation,
    /// Mask-restricted blending.
    Blending,
    /// Pasting the crop back into the frame.
    Compositing,
    /// Tensor conversion between stages.
    TensorOperation,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStage::Decode => write!(f, "decode"),
            ProcessingStage::Alignment => write!(f, "alignment"),
            ProcessingStage::GeometryEstimation => write!(f, "geometry estimation"),
            ProcessingStage::Rendering => write!(f, "rendering"),
            ProcessingStage::Segmentation => write!(f, "segmentation"),
            ProcessingStage::Blending => write!(f, "blending"),
            ProcessingStage::Compositing => write!(f, "compositing"),
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
        }
    }
}

/// Coarse classification used at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input the client can fix (no face, undecodable upload).
    UserInput,
    /// A model produced an unusable result.
    ModelFault,
    /// Runtime or resource failure; may be transient at the process level.
    ServiceDegraded,
    /// The process is not able to serve (models or configuration missing).
    Startup,
    /// The caller gave up on the request.
    Cancelled,
}

impl ErrorCategory {
    /// HTTP-style status code for this category.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::UserInput => 400,
            ErrorCategory::ModelFault => 500,
            ErrorCategory::ServiceDegraded => 503,
            ErrorCategory::Startup => 503,
            ErrorCategory::Cancelled => 499,
        }
    }
}

/// Errors produced anywhere in the swap pipeline.
#[derive(Error, Debug)]
pub enum SwapError {
    /// No face with sufficient confidence was found.
    #[error("no face detected in {role} image")]
    NoFaceDetected {
        /// The image that contained no usable face.
        role: ImageRole,
    },

    /// The request violated a documented input precondition.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Uploaded bytes could not be decoded as an image.
    #[error("image decode")]
    ImageDecode(#[source] image::ImageError),

    /// The result image could not be encoded.
    #[error("image encode")]
    ImageEncode(#[source] image::ImageError),

    /// The geometry model produced an invalid coefficient vector.
    #[error("geometry estimation failed{}: {reason}", role.map(|r| format!(" for {r} face")).unwrap_or_default())]
    GeometryError {
        /// The image the coefficients were estimated from, when known.
        role: Option<ImageRole>,
        /// What was wrong with the vector.
        reason: String,
    },

    /// A model invocation failed or violated its output contract.
    #[error("model '{model}' failed during {context}")]
    ModelExecution {
        /// Name of the model that failed.
        model: String,
        /// What the pipeline was doing.
        context: String,
        /// The underlying runtime error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A model could not be loaded or failed its startup canary.
    #[error("failed to load {kind} model from '{}': {reason}", path.display())]
    ModelLoad {
        /// The model kind being loaded.
        kind: ModelKind,
        /// The configured weight path.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
        /// The underlying error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cancellation was observed at a stage boundary.
    #[error("request cancelled before {stage}")]
    Cancelled {
        /// The stage that would have run next.
        stage: ProcessingStage,
    },

    /// Configuration problem detected before serving.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// Non-model processing failure inside a stage.
    #[error("{stage} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        stage: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error from the ONNX Runtime outside of a model invocation.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor reshaping.
    #[error("tensor shape")]
    Tensor(#[from] ndarray::ShapeError),

    /// Configuration file parse error.
    #[error("configuration parse")]
    ConfigParse(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// Broken internal invariant.
    #[error("internal: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl SwapError {
    /// Stable, machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            SwapError::NoFaceDetected {
                role: ImageRole::Source,
            } => "no_face_source",
            SwapError::NoFaceDetected {
                role: ImageRole::Target,
            } => "no_face_target",
            SwapError::InvalidInput { .. } | SwapError::ImageDecode(_) => "invalid_input",
            SwapError::ImageEncode(_) => "encode_error",
            SwapError::GeometryError { .. } => "geometry_error",
            SwapError::ModelExecution { .. } | SwapError::Session(_) => "model_execution_error",
            SwapError::ModelLoad { .. } => "model_load_error",
            SwapError::Cancelled { .. } => "cancelled",
            SwapError::Config { .. } | SwapError::ConfigParse(_) => "config_error",
            SwapError::Processing { .. } | SwapError::Tensor(_) => "processing_error",
            SwapError::Io(_) => "io_error",
            SwapError::Internal { .. } => "internal_error",
        }
    }

    /// Coarse category used to pick a client-visible status.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SwapError::NoFaceDetected { .. }
            | SwapError::InvalidInput { .. }
            | SwapError::ImageDecode(_) => ErrorCategory::UserInput,
            SwapError::GeometryError { .. } => ErrorCategory::ModelFault,
            SwapError::ModelLoad { .. } | SwapError::Config { .. } | SwapError::ConfigParse(_) => {
                ErrorCategory::Startup
            }
            SwapError::Cancelled { .. } => ErrorCategory::Cancelled,
            SwapError::ModelExecution { .. }
            | SwapError::Session(_)
            | SwapError::ImageEncode(_)
            | SwapError::Processing { .. }
            | SwapError::Tensor(_)
            | SwapError::Io(_)
            | SwapError::Internal { .. } => ErrorCategory::ServiceDegraded,
        }
    }

    /// Returns true when the client can fix the failure by sending other input.
    pub fn is_user_correctable(&self) -> bool {
        self.category() == ErrorCategory::UserInput
    }

    /// Attaches the image role to a geometry failure; other variants pass through.
    pub fn with_role(self, role: ImageRole) -> Self {
        match self {
            SwapError::GeometryError { role: None, reason } => SwapError::GeometryError {
                role: Some(role),
                reason,
            },
            other => other,
        }
    }
}

/// A message-only error used as the source of wrapped failures.
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SimpleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_role() {
        let source = SwapError::NoFaceDetected {
            role: ImageRole::Source,
        };
        let target = SwapError::NoFaceDetected {
            role: ImageRole::Target,
        };
        assert_ne!(source.code(), target.code());
        assert_eq!(source.to_string(), "no face detected in source image");
    }

    #[test]
    fn test_categories() {
        let geometry = SwapError::GeometryError {
            role: None,
            reason: "NaN at index 3".to_string(),
        };
        assert_eq!(geometry.category(), ErrorCategory::ModelFault);
        assert_eq!(geometry.category().status_code(), 500);

        let exec = SwapError::model_execution("renderer", "forward pass", SimpleError::new("oom"));
        assert_eq!(exec.category(), ErrorCategory::ServiceDegraded);
        assert_eq!(exec.code(), "model_execution_error");

        let cancelled = SwapError::Cancelled {
            stage: ProcessingStage::Rendering,
        };
        assert_eq!(cancelled.category().status_code(), 499);
        assert!(!cancelled.is_user_correctable());
    }

    #[test]
    fn test_with_role_only_touches_geometry() {
        let err = SwapError::GeometryError {
            role: None,
            reason: "bad".to_string(),
        }
        .with_role(ImageRole::Target);
        assert!(err.to_string().contains("for target face"));

        let other = SwapError::invalid_input("x").with_role(ImageRole::Source);
        assert_eq!(other.code(), "invalid_input");
    }

    #[test]
    fn test_model_load_message_includes_path() {
        let err = SwapError::model_load(
            ModelKind::Parser,
            "/models/parser.onnx",
            "file not found",
            None::<SimpleError>,
        );
        let text = err.to_string();
        assert!(text.contains("parser"));
        assert!(text.contains("/models/parser.onnx"));
        assert_eq!(err.category(), ErrorCategory::Startup);
    }
}
