//! Upload error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::transport::error_response;

/// Reasons an upload is refused before the capability runs.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No file arrived in the expected field.
    #[error("No file uploaded (expected field '{field}')")]
    MissingFile { field: &'static str },

    /// More files than the discipline allows.
    #[error("Too many files (maximum {max})")]
    TooManyFiles { max: usize },

    /// The file's content type is not accepted by the discipline.
    #[error("{0}")]
    UnsupportedType(String),

    /// A file or the whole body exceeds the size cap.
    #[error("File too large (maximum {max_bytes} bytes)")]
    PayloadTooLarge { max_bytes: u64 },

    /// The multipart body could not be read.
    #[error("Malformed upload: {0}")]
    Malformed(String),

    /// Writing to the staging area failed.
    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),
}

impl UploadError {
    /// Convert a multipart read failure, keeping the body-limit case distinct.
    pub fn from_multipart(err: axum::extract::multipart::MultipartError, max_bytes: u64) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge { max_bytes }
        } else {
            Self::Malformed(err.body_text())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingFile { .. }
            | Self::TooManyFiles { .. }
            | Self::UnsupportedType(_)
            | Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Staging(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Upload staging failed: {}", self);
            return error_response(status, "Failed to process upload");
        }
        warn!("Upload rejected: {}", self);
        error_response(status, self.to_string())
    }
}
