//! Helpers for working directly with ONNX Runtime sessions.

use crate::core::errors::{SimpleError, SwapError};
use crate::domain::ModelKind;
use ort::logging::LogLevel;
use ort::session::{Session, builder::SessionBuilder};
use std::path::Path;

const SESSION_CREATION_FAILURE: &str = "failed to create ONNX session";

/// Loads a session with default logging configuration.
pub fn load_session(kind: ModelKind, model_path: impl AsRef<Path>) -> Result<Session, SwapError> {
    load_session_with(
        kind,
        model_path,
        |builder| builder.with_log_level(LogLevel::Error),
        Some("verify model file exists and is readable"),
    )
}

/// Builds a session using a caller-provided builder configuration.
pub(crate) fn load_session_with<F>(
    kind: ModelKind,
    model_path: impl AsRef<Path>,
    configure_builder: F,
    suggestion: Option<&str>,
) -> Result<Session, SwapError>
where
    F: FnOnce(SessionBuilder) -> Result<SessionBuilder, ort::Error>,
{
    let path = model_path.as_ref();
    if !path.is_file() {
        return Err(SwapError::model_load(
            kind,
            path,
            "weight file does not exist",
            None::<SimpleError>,
        ));
    }
    let reason = match suggestion {
        Some(hint) => format!("{SESSION_CREATION_FAILURE}; suggested fix: {hint}"),
        None => SESSION_CREATION_FAILURE.to_string(),
    };
    let builder = Session::builder()
        .and_then(configure_builder)
        .map_err(|e| SwapError::model_load(kind, path, reason.clone(), Some(e)))?;
    builder
        .commit_from_file(path)
        .map_err(|e| SwapError::model_load(kind, path, reason, Some(e)))
}
