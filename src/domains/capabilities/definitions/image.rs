//! Image tools, backed by ImageMagick.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::{info, instrument};

use super::command::{self, MAGICK};
use crate::domains::capabilities::{
    Capability, CapabilityError, CapabilityOutput, CapabilityRequest,
};
use crate::domains::uploads::StagedFile;

const DEFAULT_QUALITY: u8 = 80;

/// File extension for an accepted image content type.
fn image_extension(file: &StagedFile) -> &'static str {
    match file.content_type.as_deref() {
        Some("image/jpeg") => "jpeg",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        _ => "png",
    }
}

fn content_type_for(extension: &str) -> String {
    format!("image/{}", extension)
}

/// Run `magick <input> <ops...> <output>` and read the result.
async fn convert(
    input: &Path,
    operations: &[&str],
    output: &Path,
    failure: &str,
) -> Result<bytes::Bytes, CapabilityError> {
    let mut args: Vec<OsString> = vec![input.as_os_str().to_owned()];
    args.extend(operations.iter().map(OsString::from));
    args.push(output.as_os_str().to_owned());

    command::run(MAGICK, &args, failure).await?;
    command::read_output(output, failure).await
}

// ============================================================================
// Resize
// ============================================================================

/// Scales an image to fit inside the requested box, keeping the aspect ratio.
pub struct ImageResizeTool;

impl ImageResizeTool {
    pub const SLUG: &'static str = "image-resize";

    const FAILURE: &'static str = "Failed to resize image";
}

#[async_trait]
impl Capability for ImageResizeTool {
    fn name(&self) -> &str {
        Self::SLUG
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        command::require(MAGICK)
    }

    #[instrument(skip_all)]
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        let input = request.single_file()?;
        let geometry = resize_geometry(
            request.parsed_option::<u32>("width")?,
            request.parsed_option::<u32>("height")?,
        )?;

        let extension = image_extension(input);
        let filename = format!("resized.{}", extension);
        let output = request.scratch_dir.join(&filename);
        let bytes = convert(&input.path, &["-resize", geometry.as_str()], &output, Self::FAILURE).await?;

        info!("Resized image to {} ({} bytes)", geometry, bytes.len());
        Ok(CapabilityOutput::file(bytes, &content_type_for(extension), &filename))
    }
}

/// ImageMagick geometry for a fit-inside resize.
fn resize_geometry(width: Option<u32>, height: Option<u32>) -> Result<String, CapabilityError> {
    match (width.filter(|w| *w > 0), height.filter(|h| *h > 0)) {
        (None, None) => Err(CapabilityError::invalid_input("Width or height is required")),
        (Some(w), None) => Ok(format!("{}x", w)),
        (None, Some(h)) => Ok(format!("x{}", h)),
        (Some(w), Some(h)) => Ok(format!("{}x{}", w, h)),
    }
}

// ============================================================================
// Convert
// ============================================================================

/// Re-encodes an image in another format.
pub struct ImageConvertTool;

impl ImageConvertTool {
    pub const SLUG: &'static str = "image-convert";

    const FAILURE: &'static str = "Failed to convert image";

    const DEFAULT_FORMAT: &'static str = "png";
}

#[async_trait]
impl Capability for ImageConvertTool {
    fn name(&self) -> &str {
        Self::SLUG
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        command::require(MAGICK)
    }

    #[instrument(skip_all)]
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        let input = request.single_file()?;
        let requested = request
            .option("format")
            .unwrap_or(Self::DEFAULT_FORMAT)
            .to_ascii_lowercase();
        let format = match requested.as_str() {
            "jpg" | "jpeg" => "jpeg",
            "png" => "png",
            "webp" => "webp",
            _ => {
                return Err(CapabilityError::invalid_input(
                    "Invalid format. Supported: jpg, png, webp",
                ));
            }
        };

        let filename = format!("converted.{}", requested);
        let output = request.scratch_dir.join(&filename);
        let bytes = convert(&input.path, &[], &output, Self::FAILURE).await?;

        info!("Converted image to {} ({} bytes)", format, bytes.len());
        Ok(CapabilityOutput::file(bytes, &content_type_for(format), &filename))
    }
}

// ============================================================================
// Compress
// ============================================================================

/// Re-encodes an image at a lower quality, in its original format.
pub struct ImageCompressTool;

impl ImageCompressTool {
    pub const SLUG: &'static str = "image-compress";

    const FAILURE: &'static str = "Failed to compress image";
}

#[async_trait]
impl Capability for ImageCompressTool {
    fn name(&self) -> &str {
        Self::SLUG
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        command::require(MAGICK)
    }

    #[instrument(skip_all)]
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        let input = request.single_file()?;
        let quality = request
            .parsed_option::<u8>("quality")?
            .unwrap_or(DEFAULT_QUALITY);
        if !(1..=100).contains(&quality) {
            return Err(CapabilityError::invalid_input(
                "Quality must be between 1 and 100",
            ));
        }

        let extension = image_extension(input);
        let filename = format!("compressed.{}", extension);
        let output = request.scratch_dir.join(&filename);
        let quality = quality.to_string();
        let bytes = convert(
            &input.path,
            &["-strip", "-quality", quality.as_str()],
            &output,
            Self::FAILURE,
        )
        .await?;

        info!(
            "Compressed image at quality {} from {} to {} bytes",
            quality,
            input.size,
            bytes.len()
        );
        Ok(CapabilityOutput::file(bytes, &content_type_for(extension), &filename))
    }
}

// ============================================================================
// Remove background
// ============================================================================

/// Makes near-white background pixels transparent; always produces PNG.
pub struct ImageRemoveBgTool;

impl ImageRemoveBgTool {
    pub const SLUG: &'static str = "image-remove-bg";

    const FAILURE: &'static str = "Failed to remove background";
}

#[async_trait]
impl Capability for ImageRemoveBgTool {
    fn name(&self) -> &str {
        Self::SLUG
    }

    fn probe(&self) -> Result<(), CapabilityError> {
        command::require(MAGICK)
    }

    #[instrument(skip_all)]
    async fn invoke(&self, request: CapabilityRequest) -> Result<CapabilityOutput, CapabilityError> {
        let input = request.single_file()?;
        let output = request.scratch_dir.join("no-background.png");
        let bytes = convert(
            &input.path,
            &["-alpha", "set", "-fuzz", "10%", "-transparent", "white"],
            &output,
            Self::FAILURE,
        )
        .await?;

        info!("Removed background ({} bytes)", bytes.len());
        Ok(CapabilityOutput::file(bytes, "image/png", "no-background.png"))
    }
}
