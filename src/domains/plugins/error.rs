//! Plugin loading error types.

use std::path::PathBuf;
use thiserror::Error;

/// Problems found while discovering tools.
///
/// Only [`LoadError::SourceRootUnavailable`] aborts discovery. Every other
/// variant is scoped to a single tool and ends up in the `LoadReport`.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The tool source root cannot be read at all.
    #[error("Tool source root '{path}' is unavailable: {source}")]
    SourceRootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool directory has no descriptor; the tool is excluded.
    #[error("Missing descriptor in '{dir}'")]
    DescriptorMissing { dir: String },

    /// The descriptor cannot be read, parsed or validated; the tool is excluded.
    #[error("Invalid descriptor in '{dir}': {reason}")]
    DescriptorInvalid { dir: String, reason: String },

    /// The metadata file is unreadable; the tool keeps empty metadata.
    #[error("Invalid metadata in '{dir}': {reason}")]
    MetadataInvalid { dir: String, reason: String },

    /// The schema file is unreadable; the tool keeps an empty schema.
    #[error("Invalid schema in '{dir}': {reason}")]
    SchemaInvalid { dir: String, reason: String },

    /// No usable capability; the tool is listed but gets no route.
    #[error("No capability for '{slug}': {reason}")]
    CapabilityUnresolvable { slug: String, reason: String },

    /// Another tool already claimed this slug in the same category; the later one is excluded.
    #[error("Duplicate slug '{slug}' in category '{category}' from '{dir}' (already loaded from '{existing}')")]
    DuplicateTool {
        category: String,
        slug: String,
        dir: String,
        existing: String,
    },
}

impl LoadError {
    /// Whether the tool this error belongs to was kept in the registry.
    pub fn tool_admitted(&self) -> bool {
        matches!(
            self,
            Self::MetadataInvalid { .. }
                | Self::SchemaInvalid { .. }
                | Self::CapabilityUnresolvable { .. }
        )
    }

    pub(crate) fn descriptor_invalid(dir: &str, reason: impl Into<String>) -> Self {
        Self::DescriptorInvalid {
            dir: dir.to_string(),
            reason: reason.into(),
        }
    }
}
