//! Capability error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::transport::error_response;

/// Errors a capability can report.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The request is unusable for this tool (client error).
    #[error("{0}")]
    InvalidInput(String),

    /// The tool failed while processing (server error). Only `message`
    /// reaches the client; `detail` is logged.
    #[error("{message}: {detail}")]
    Failed { message: String, detail: String },

    /// The capability cannot run in this process at all.
    #[error("Capability unavailable: {0}")]
    Unavailable(String),
}

impl CapabilityError {
    /// Create a new "invalid input" error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new "failed" error.
    pub fn failed(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::Failed {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    /// Create a new "unavailable" error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Failed { .. } | Self::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CapabilityError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidInput(msg) => {
                warn!("Capability rejected input: {}", msg);
                error_response(StatusCode::BAD_REQUEST, msg)
            }
            Self::Failed { message, detail } => {
                error!("{}: {}", message, detail);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            Self::Unavailable(reason) => {
                error!("Capability unavailable: {}", reason);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Processing failed")
            }
        }
    }
}
