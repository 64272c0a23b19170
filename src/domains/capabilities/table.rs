//! Capability table - the static mapping from tool slug to processing logic.
//!
//! Tool directories on disk carry data only. The code that runs behind a
//! tool route is compiled in and looked up here by the tool's slug.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::capability::Capability;
use super::definitions::{
    ImageCompressTool, ImageConvertTool, ImageRemoveBgTool, ImageResizeTool, PdfCompressTool,
    PdfMergeTool, PdfSplitTool,
};
use super::error::CapabilityError;

/// Slug-keyed capability table.
#[derive(Clone, Default)]
pub struct CapabilityTable {
    entries: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table of capabilities shipped with the server.
    pub fn builtin() -> Self {
        Self::new()
            .with(PdfMergeTool::SLUG, Arc::new(PdfMergeTool))
            .with(PdfSplitTool::SLUG, Arc::new(PdfSplitTool))
            .with(PdfCompressTool::SLUG, Arc::new(PdfCompressTool))
            .with(ImageResizeTool::SLUG, Arc::new(ImageResizeTool))
            .with(ImageConvertTool::SLUG, Arc::new(ImageConvertTool))
            .with(ImageCompressTool::SLUG, Arc::new(ImageCompressTool))
            .with(ImageRemoveBgTool::SLUG, Arc::new(ImageRemoveBgTool))
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, slug: impl Into<String>, capability: Arc<dyn Capability>) -> Self {
        self.insert(slug, capability);
        self
    }

    /// Register a capability, replacing any previous entry for the slug.
    pub fn insert(&mut self, slug: impl Into<String>, capability: Arc<dyn Capability>) {
        self.entries.insert(slug.into(), capability);
    }

    /// Look up and probe the capability for a slug.
    pub fn resolve(&self, slug: &str) -> Result<Arc<dyn Capability>, CapabilityError> {
        let capability = self
            .entries
            .get(slug)
            .ok_or_else(|| CapabilityError::unavailable(format!("no capability registered for '{}'", slug)))?;
        capability.probe()?;
        Ok(Arc::clone(capability))
    }

    /// Registered slugs, sorted.
    pub fn slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("slugs", &self.slugs())
            .finish()
    }
}
