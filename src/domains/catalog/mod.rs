//! Catalog domain.
//!
//! Read-only HTTP surface over the registry, projecting each plugin into the
//! requested language on demand.

mod error;
pub mod handlers;
pub mod projection;

pub use error::CatalogError;
pub use handlers::{CatalogQuery, CatalogState, catalog_router};
pub use projection::{CatalogEntry, DEFAULT_ICON, DEFAULT_SUBMIT_TEXT, project};
