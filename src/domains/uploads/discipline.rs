//! Upload disciplines.
//!
//! A discipline fixes the multipart field name, how many files a request may
//! carry, which content types are accepted and how large each file may be.
//! Exactly one discipline is chosen per tool route, from the tool's schema.

use std::fmt;

use super::error::UploadError;
use crate::core::config::UploadsConfig;
use crate::domains::plugins::UploadSpec;

/// The only document type the single-document discipline accepts.
pub const DOCUMENT_CONTENT_TYPE: &str = "application/pdf";

/// Content types the single-image discipline accepts.
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Slack added to body limits for multipart framing and option fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// How a tool route accepts uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDiscipline {
    /// Several files in the `files` field, any content type.
    MultiFile { max_files: usize, max_file_bytes: u64 },
    /// One PDF in the `file` field.
    SingleDocument { max_bytes: u64 },
    /// One image in the `file` field.
    SingleImage { max_bytes: u64 },
}

impl UploadDiscipline {
    /// Pick the discipline for a tool's upload spec.
    ///
    /// `multiple` wins over everything; otherwise a document type in `types`
    /// selects the document discipline, and anything else is an image upload.
    pub fn select(spec: &UploadSpec, limits: &UploadsConfig) -> Self {
        if spec.multiple {
            let declared = spec.max_files as usize;
            let max_files = if declared == 0 {
                limits.max_files
            } else {
                declared.min(limits.max_files)
            };
            return Self::MultiFile {
                max_files: max_files.max(1),
                max_file_bytes: limits.max_document_bytes,
            };
        }

        if spec.types.iter().any(|t| is_document_type(t)) {
            Self::SingleDocument {
                max_bytes: limits.max_document_bytes,
            }
        } else {
            Self::SingleImage {
                max_bytes: limits.max_image_bytes,
            }
        }
    }

    /// Multipart field carrying the file(s).
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::MultiFile { .. } => "files",
            Self::SingleDocument { .. } | Self::SingleImage { .. } => "file",
        }
    }

    pub fn max_files(&self) -> usize {
        match self {
            Self::MultiFile { max_files, .. } => *max_files,
            Self::SingleDocument { .. } | Self::SingleImage { .. } => 1,
        }
    }

    pub fn max_file_bytes(&self) -> u64 {
        match self {
            Self::MultiFile { max_file_bytes, .. } => *max_file_bytes,
            Self::SingleDocument { max_bytes } | Self::SingleImage { max_bytes } => *max_bytes,
        }
    }

    /// Limit for the whole request body.
    pub fn body_limit(&self) -> usize {
        let files = self.max_files() as u64;
        let total = self
            .max_file_bytes()
            .saturating_mul(files)
            .saturating_add(MULTIPART_OVERHEAD_BYTES);
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    /// Check a part's declared content type against the discipline's filter.
    pub fn accepts(&self, content_type: Option<&str>) -> Result<(), UploadError> {
        let essence = content_type.map(media_type_essence);
        match self {
            Self::MultiFile { .. } => Ok(()),
            Self::SingleDocument { .. } => match essence.as_deref() {
                Some(DOCUMENT_CONTENT_TYPE) => Ok(()),
                _ => Err(UploadError::UnsupportedType(
                    "Only PDF files are allowed".to_string(),
                )),
            },
            Self::SingleImage { .. } => match essence.as_deref() {
                Some(t) if IMAGE_CONTENT_TYPES.contains(&t) => Ok(()),
                _ => Err(UploadError::UnsupportedType(
                    "Only image files are allowed (JPG, PNG, WEBP, GIF)".to_string(),
                )),
            },
        }
    }
}

impl fmt::Display for UploadDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultiFile { max_files, .. } => write!(f, "multi-file, up to {}", max_files),
            Self::SingleDocument { .. } => write!(f, "single document"),
            Self::SingleImage { .. } => write!(f, "single image"),
        }
    }
}

/// Whether a declared type names the PDF document format.
fn is_document_type(declared: &str) -> bool {
    declared.to_ascii_lowercase().contains("pdf")
}

/// `Application/PDF; charset=binary` -> `application/pdf`
fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
