//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the toolbox
//! server: configuration, error handling, path security, server assembly and
//! the HTTP transport.

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use security::{PathSecurityError, ensure_within_root};
pub use server::ToolboxServer;
pub use transport::{HttpConfig, HttpTransport};
