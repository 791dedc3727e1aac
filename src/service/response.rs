//! Client-facing views of pipeline results.

use crate::registry::RegistryCell;
use headswap_core::core::{ErrorCategory, SwapError};
use serde::Serialize;
use thiserror::Error;

/// A failure as reported to a client.
///
/// User-correctable failures carry the full message; everything else gets a
/// generic message so runtime details stay in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{status} ({code}): {message}")]
pub struct ClientError {
    /// Stable reason code.
    pub code: &'static str,
    /// HTTP-style status.
    pub status: u16,
    /// Human readable message.
    pub message: String,
    #[serde(skip)]
    pub category: ErrorCategory,
}

impl From<&SwapError> for ClientError {
    fn from(err: &SwapError) -> Self {
        let category = err.category();
        let message = match category {
            ErrorCategory::UserInput => err.to_string(),
            ErrorCategory::ModelFault => "the face could not be processed".to_string(),
            ErrorCategory::ServiceDegraded => {
                "the service is temporarily unable to process the request".to_string()
            }
            ErrorCategory::Startup => "the service is not ready".to_string(),
            ErrorCategory::Cancelled => "the request was cancelled".to_string(),
        };
        Self {
            code: err.code(),
            status: category.status_code(),
            message,
            category,
        }
    }
}

impl From<SwapError> for ClientError {
    fn from(err: SwapError) -> Self {
        Self::from(&err)
    }
}

/// Readiness probe payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// `"healthy"` once models are loaded, `"loading"` before.
    pub status: &'static str,
    pub version: &'static str,
}

impl HealthStatus {
    pub fn from_cell(cell: &RegistryCell) -> Self {
        Self {
            status: if cell.is_ready() { "healthy" } else { "loading" },
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
