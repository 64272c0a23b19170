//! Errors ending a tool request.

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::domains::capabilities::CapabilityError;
use crate::domains::uploads::UploadError;

/// Why a tool request did not produce a capability output.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        match self {
            Self::Upload(e) => e.into_response(),
            Self::Capability(e) => e.into_response(),
        }
    }
}
