//! Catalog error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::debug;

use crate::core::transport::error_response;

/// Errors returned by the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No plugin has the requested slug.
    #[error("Plugin not found: {0}")]
    NotFound(String),
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(slug) => {
                debug!("Catalog lookup missed: {}", slug);
                error_response(StatusCode::NOT_FOUND, "Plugin not found")
            }
        }
    }
}
