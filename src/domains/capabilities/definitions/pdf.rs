//! PDF tools, backed by qpdf.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use tracing::{info, instrument};

use super::command::{self, QPDF};
use crate::domains::capabilities::{
    Capability, CapabilityError, CapabilityOutput, CapabilityRequest,
};

const PDF: &str = "application/pdf";
const ZIP: &str = "application/zip";

// ============================================================================
// Merge
// ============================================================================

/// Concatenates the pages of every uploaded PDF, in upload order.
pub struct PdfMergeTool;

impl PdfMergeTool {
    pub const SLUG: &'static str = "pdf-merge";

    const FAILURE: &'static str = "Failed to merge PDFs";
}

#[async_trait]
impl Capability for PdfMergeTool {
    fn name(&self) -> &str {
        Self::SLUG
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        command::require(QPDF)
    }

    #[instrument(skip_all, fields(files = request.files.len()))]
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        if request.files.len() < 2 {
            return Err(CapabilityError::invalid_input(
                "At least 2 PDF files are required",
            ));
        }

        let output = request.scratch_dir.join("merged.pdf");
        let mut args: Vec<OsString> = vec!["--empty".into(), "--pages".into()];
        args.extend(request.files.iter().map(|f| f.path.clone().into_os_string()));
        args.push("--".into());
        args.push(output.clone().into_os_string());

        command::run(QPDF, &args, Self::FAILURE).await?;
        let bytes = command::read_output(&output, Self::FAILURE).await?;

        info!("Merged {} PDFs ({} bytes)", request.files.len(), bytes.len());
        Ok(CapabilityOutput::file(bytes, PDF, "merged.pdf"))
    }
}

// ============================================================================
// Split
// ============================================================================

/// Splits a PDF into one file per page, returned as a zip archive.
pub struct PdfSplitTool;

impl PdfSplitTool {
    pub const SLUG: &'static str = "pdf-split";

    const FAILURE: &'static str = "Failed to split PDF";
}

#[async_trait]
impl Capability for PdfSplitTool {
    fn name(&self) -> &str {
        Self::SLUG
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        command::require(QPDF)
    }

    #[instrument(skip_all)]
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        let input = request.single_file()?;
        let pages_dir = request.scratch_dir.join("pages");
        tokio::fs::create_dir(&pages_dir)
            .await
            .map_err(|e| CapabilityError::failed(Self::FAILURE, e))?;

        // qpdf replaces %d with the zero-padded page number.
        command::run(
            QPDF,
            [
                OsString::from("--split-pages"),
                input.path.clone().into_os_string(),
                pages_dir.join("page-%d.pdf").into_os_string(),
            ],
            Self::FAILURE,
        )
        .await?;

        let archive = tokio::task::spawn_blocking(move || zip_pages(pages_dir))
            .await
            .map_err(|e| CapabilityError::failed(Self::FAILURE, e))??;

        info!("Split PDF into archive of {} bytes", archive.len());
        Ok(CapabilityOutput::file(archive, ZIP, "split-pages.zip"))
    }
}

/// Zip every page file in `dir` as `page-<n>.pdf`, in page order.
fn zip_pages(dir: PathBuf) -> Result<Vec<u8>, CapabilityError> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(split_failed)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "pdf"))
        .collect();
    // Zero padding makes lexical order equal page order.
    pages.sort();

    if pages.is_empty() {
        return Err(split_failed("qpdf produced no pages"));
    }

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (index, page) in pages.iter().enumerate() {
        let bytes = std::fs::read(page).map_err(split_failed)?;
        zip.start_file(format!("page-{}.pdf", index + 1), options)
            .map_err(split_failed)?;
        zip.write_all(&bytes).map_err(split_failed)?;
    }

    let cursor = zip.finish().map_err(split_failed)?;
    Ok(cursor.into_inner())
}

fn split_failed(detail: impl ToString) -> CapabilityError {
    CapabilityError::failed(PdfSplitTool::FAILURE, detail)
}

// ============================================================================
// Compress
// ============================================================================

/// Rewrites a PDF with compressed object streams.
pub struct PdfCompressTool;

impl PdfCompressTool {
    pub const SLUG: &'static str = "pdf-compress";

    const FAILURE: &'static str = "Failed to compress PDF";
}

#[async_trait]
impl Capability for PdfCompressTool {
    fn name(&self) -> &str {
        Self::SLUG
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        command::require(QPDF)
    }

    #[instrument(skip_all)]
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        let input = request.single_file()?;
        let output = request.scratch_dir.join("compressed.pdf");

        command::run(
            QPDF,
            [
                OsString::from("--object-streams=generate"),
                OsString::from("--compress-streams=y"),
                OsString::from("--recompress-flate"),
                input.path.clone().into_os_string(),
                output.clone().into_os_string(),
            ],
            Self::FAILURE,
        )
        .await?;

        let bytes = command::read_output(&output, Self::FAILURE).await?;
        info!("Compressed PDF from {} to {} bytes", input.size, bytes.len());
        Ok(CapabilityOutput::file(bytes, PDF, "compressed.pdf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::uploads::StagedFile;
    use std::io::Read;
    use tempfile::TempDir;

    fn request(scratch: &TempDir, count: usize) -> CapabilityRequest {
        CapabilityRequest {
            files: (0..count)
                .map(|i| StagedFile {
                    path: scratch.path().join(format!("{}.pdf", i)),
                    original_name: None,
                    content_type: Some(PDF.to_string()),
                    size: 0,
                })
                .collect(),
            options: Default::default(),
            scratch_dir: scratch.path().to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_merge_needs_two_files() {
        let scratch = TempDir::new().unwrap();
        let err = PdfMergeTool.invoke(request(&scratch, 1)).await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput(ref m) if m == "At least 2 PDF files are required"));
    }

    #[tokio::test]
    async fn test_split_needs_a_file() {
        let scratch = TempDir::new().unwrap();
        let err = PdfSplitTool.invoke(request(&scratch, 0)).await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput(_)));
    }

    #[test]
    fn test_zip_pages_in_page_order() {
        let dir = TempDir::new().unwrap();
        for n in ["01", "02", "10"] {
            std::fs::write(dir.path().join(format!("page-{}.pdf", n)), n).unwrap();
        }

        let bytes = zip_pages(dir.path().to_path_buf()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut third = String::new();
        archive
            .by_name("page-3.pdf")
            .unwrap()
            .read_to_string(&mut third)
            .unwrap();
        assert_eq!(third, "10");
    }

    #[test]
    fn test_zip_pages_empty_dir_fails() {
        let dir = TempDir::new().unwrap();
        assert!(zip_pages(dir.path().to_path_buf()).is_err());
    }
}
