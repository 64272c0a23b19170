//! Toolbox Server Library
//!
//! A file-tool server whose tools are discovered from a directory tree at
//! startup. Each tool directory carries a descriptor, optional localized
//! metadata and an optional upload/options schema; the processing logic is
//! looked up in a static capability table by the tool's slug.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, server assembly, HTTP transport
//! - **domains**: business logic organized by bounded contexts
//!   - **plugins**: loader, locale resolver and registry
//!   - **catalog**: `GET /api/plugins` and `GET /api/plugins/{slug}`
//!   - **uploads**: upload disciplines and staged-file cleanup
//!   - **capabilities**: the built-in PDF and image tools
//!   - **routes**: one `POST /api/{category}/{slug}` per routable tool
//!
//! # Example
//!
//! ```rust,no_run
//! use toolbox_server::core::{Config, HttpTransport, ToolboxServer};
//! use toolbox_server::domains::capabilities::CapabilityTable;
//!
//! #[tokio::main]
//! async fn main() -> toolbox_server::Result<()> {
//!     let config = Config::from_env();
//!     let transport = HttpTransport::new(config.transport.clone());
//!     let server = ToolboxServer::bootstrap(config, CapabilityTable::builtin())?;
//!     transport.run(server).await
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, Result, ToolboxServer};
