//! Built-in capability definitions.
//!
//! Each tool is an adapter over an external converter; the shared process
//! handling lives in `command`.

mod command;
pub mod image;
pub mod pdf;

pub use image::{ImageCompressTool, ImageConvertTool, ImageRemoveBgTool, ImageResizeTool};
pub use pdf::{PdfCompressTool, PdfMergeTool, PdfSplitTool};
