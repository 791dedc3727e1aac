//! Constructor helpers for [`SwapError`].
//!
//! These keep call sites short and make sure wrapped errors always carry the
//! model name or stage they came from.

use super::{ProcessingStage, SimpleError, SwapError};
use crate::domain::ModelKind;
use std::path::Path;

impl SwapError {
    /// Creates a model execution error.
    ///
    /// # Arguments
    ///
    /// * `model` - Name of the model that failed.
    /// * `context` - What the pipeline was doing when it failed.
    /// * `error` - The underlying error.
    pub fn model_execution(
        model: impl Into<String>,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ModelExecution {
            model: model.into(),
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a model execution error for an output that violates the tensor contract.
    pub fn output_contract(
        model: impl Into<String>,
        expected: &str,
        actual_shape: &[usize],
    ) -> Self {
        Self::ModelExecution {
            model: model.into(),
            context: "output validation".to_string(),
            source: Box::new(SimpleError::new(format!(
                "expected output {expected}, got shape {actual_shape:?}"
            ))),
        }
    }

    /// Creates a model load error.
    ///
    /// # Arguments
    ///
    /// * `kind` - The model kind being loaded.
    /// * `path` - The configured weight path.
    /// * `reason` - Why loading failed.
    /// * `source` - The underlying error, if any.
    pub fn model_load(
        kind: ModelKind,
        path: impl AsRef<Path>,
        reason: impl Into<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            kind,
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a configuration error naming the offending field.
    pub fn config_field(field: &str, value: impl std::fmt::Display, reason: &str) -> Self {
        Self::Config {
            message: format!("invalid value '{value}' for '{field}': {reason}"),
        }
    }

    /// Creates a geometry error without an image role attached.
    pub fn geometry(reason: impl Into<String>) -> Self {
        Self::GeometryError {
            role: None,
            reason: reason.into(),
        }
    }

    /// Creates a processing error for the given stage.
    pub fn processing(
        stage: ProcessingStage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            stage,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a tensor operation error with expected and actual shapes.
    pub fn tensor_operation(context: &str, expected: &[usize], actual: &[usize]) -> Self {
        Self::Processing {
            stage: ProcessingStage::TensorOperation,
            context: context.to_string(),
            source: Box::new(SimpleError::new(format!(
                "expected shape {expected:?}, got {actual:?}"
            ))),
        }
    }

    /// Creates an internal invariant error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_contract_message() {
        let err = SwapError::output_contract("renderer", "[1, 3, 512, 512]", &[1, 3, 256, 256]);
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(source.contains("[1, 3, 256, 256]"));
    }

    #[test]
    fn test_config_field() {
        let err = SwapError::config_field("feather_px", 0, "must be positive");
        assert!(err.to_string().contains("feather_px"));
    }

    #[test]
    fn test_tensor_operation() {
        let err = SwapError::tensor_operation("mask upload", &[1, 1, 4, 4], &[1, 1, 2, 2]);
        assert_eq!(err.code(), "processing_error");
    }
}
