//! The capability invocation contract.
//!
//! A capability is the processing logic behind one tool route. It receives
//! the staged upload paths and the parsed option fields, and returns either a
//! file download or a JSON payload.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::PathBuf;

use super::error::CapabilityError;
use crate::core::transport::ApiResponse;
use crate::domains::uploads::StagedFile;

/// Input handed to a capability.
#[derive(Debug, Clone)]
pub struct CapabilityRequest {
    /// Staged uploads in the order they arrived.
    pub files: Vec<StagedFile>,

    /// Option fields declared by the tool's schema, defaults applied.
    pub options: HashMap<String, String>,

    /// Empty directory for intermediate output, removed with the upload.
    pub scratch_dir: PathBuf,
}

impl CapabilityRequest {
    /// The only staged file, for single-upload tools.
    pub fn single_file(&self) -> Result<&StagedFile, CapabilityError> {
        match self.files.as_slice() {
            [file] => Ok(file),
            [] => Err(CapabilityError::invalid_input("A file is required")),
            _ => Err(CapabilityError::invalid_input("Exactly one file is expected")),
        }
    }

    /// A non-empty option value.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Parse an option, rejecting malformed values as invalid input.
    pub fn parsed_option<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, CapabilityError> {
        match self.option(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| CapabilityError::invalid_input(format!("Invalid value for {}", name))),
        }
    }
}

/// What a capability produces.
#[derive(Debug, Clone)]
pub enum CapabilityOutput {
    /// A download, sent with `Content-Disposition: attachment`.
    File {
        bytes: Bytes,
        content_type: String,
        filename: String,
    },
    /// A structured result, sent as `{ "success": true, "data": ... }`.
    Json(serde_json::Value),
}

impl CapabilityOutput {
    pub fn file(bytes: impl Into<Bytes>, content_type: &str, filename: &str) -> Self {
        Self::File {
            bytes: bytes.into(),
            content_type: content_type.to_string(),
            filename: filename.to_string(),
        }
    }
}

impl IntoResponse for CapabilityOutput {
    fn into_response(self) -> Response {
        match self {
            Self::File {
                bytes,
                content_type,
                filename,
            } => {
                let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
                (
                    [
                        (header::CONTENT_TYPE, content_type),
                        (header::CONTENT_DISPOSITION, disposition),
                    ],
                    bytes,
                )
                    .into_response()
            }
            Self::Json(value) => ApiResponse::success(value).into_response(),
        }
    }
}

/// Processing logic behind a tool route.
#[async_trait::async_trait]
pub trait Capability: Send + Sync {
    /// Get the name of this capability, for logs.
    fn name(&self) -> &str;

    /// Check the capability can run in this process.
    ///
    /// Called once while the registry is built; a failure leaves the tool
    /// without a route.
    fn probe(&self) -> Result<(), CapabilityError> {
        Ok(())
    }

    /// Process one request.
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError>;
}

type CapabilityFuture = BoxFuture<'static, Result<CapabilityOutput, CapabilityError>>;

/// A capability backed by a closure.
pub struct FnCapability<F> {
    name: String,
    f: F,
}

impl<F> FnCapability<F>
where
    F: Fn(CapabilityRequest) -> CapabilityFuture + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait::async_trait]
impl<F> Capability for FnCapability<F>
where
    F: Fn(CapabilityRequest) -> CapabilityFuture + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        (self.f)(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use futures::FutureExt;

    fn request(options: &[(&str, &str)]) -> CapabilityRequest {
        CapabilityRequest {
            files: Vec::new(),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            scratch_dir: PathBuf::from("/tmp"),
        }
    }

    #[test]
    fn test_options() {
        let req = request(&[("width", " 640 "), ("height", ""), ("quality", "high")]);
        assert_eq!(req.option("width"), Some("640"));
        assert_eq!(req.option("height"), None);
        assert_eq!(req.parsed_option::<u32>("width").unwrap(), Some(640));
        assert_eq!(req.parsed_option::<u32>("height").unwrap(), None);
        assert!(matches!(
            req.parsed_option::<u32>("quality"),
            Err(CapabilityError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_single_file_requires_exactly_one() {
        assert!(request(&[]).single_file().is_err());
    }

    #[test]
    fn test_file_output_headers() {
        let response =
            CapabilityOutput::file(b"%PDF".to_vec(), "application/pdf", "merged.pdf").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"merged.pdf\""
        );
    }

    #[tokio::test]
    async fn test_fn_capability_invokes_closure() {
        let capability = FnCapability::new("echo", |req: CapabilityRequest| {
            async move {
                Ok::<_, CapabilityError>(CapabilityOutput::Json(
                    serde_json::json!({"files": req.files.len()}),
                ))
            }
            .boxed()
        });
        assert_eq!(capability.name(), "echo");
        assert!(capability.probe().is_ok());
        let output = capability.invoke(request(&[])).await;
        tokio_test::assert_ok!(&output);
    }
}
