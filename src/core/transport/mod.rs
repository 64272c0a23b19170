//! Transport layer for the toolbox server.
//!
//! - `http.rs` - axum listener with CORS, request tracing and graceful shutdown
//! - `envelope.rs` - the `{ success, message?, data? }` JSON envelope shared by
//!   every API response
//! - `config.rs` / `error.rs` - listener settings and failures

mod config;
pub mod envelope;
mod error;
pub mod http;

pub use config::HttpConfig;
pub use envelope::{ApiResponse, error_response};
pub use error::TransportError;
pub use http::HttpTransport;
