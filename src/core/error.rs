//! Error types and handling for the toolbox server.
//!
//! Request-time errors live with their domains and render themselves as JSON
//! envelopes. This type covers the startup path, where any failure ends the
//! process.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for toolbox server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the toolbox server.
#[derive(Debug, Error)]
pub enum Error {
    /// The tool source root could not be scanned.
    #[error("Plugin error: {0}")]
    Plugin(#[from] crate::domains::plugins::LoadError),

    /// The staging directory could not be created or swept.
    #[error("Staging directory '{path}' is unusable: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP listener failed to bind or serve.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),
}

impl Error {
    /// Create a staging error for `path`.
    pub fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Staging {
            path: path.into(),
            source,
        }
    }
}
