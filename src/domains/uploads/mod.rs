//! Uploads domain module.
//!
//! Everything that happens to a request body before a capability runs.
//!
//! ## Architecture
//!
//! - `discipline.rs` - Single/multi cardinality, type filter and size caps
//! - `staging.rs` - Collision-proof staging names and the cleanup guard
//! - `intake.rs` - Streaming multipart reader enforcing a discipline
//! - `error.rs` - Client-facing rejection types

mod discipline;
mod error;
mod intake;
mod staging;

pub use discipline::{DOCUMENT_CONTENT_TYPE, IMAGE_CONTENT_TYPES, UploadDiscipline};
pub use error::UploadError;
pub use intake::receive;
pub use staging::{StagedFile, StagedUpload, StagingArea, is_staged_name, unique_name};
