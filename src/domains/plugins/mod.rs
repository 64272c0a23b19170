//! Plugins domain module.
//!
//! Tools are authored as self-describing directories under the tool source
//! root. This module turns them into an immutable, sorted [`Registry`].
//!
//! ## Architecture
//!
//! - `types.rs` - Descriptor, schema and `Plugin` records
//! - `locale.rs` - Tagged locale trees and language projection
//! - `loader.rs` - Directory scan with per-tool failure isolation
//! - `registry.rs` - The read-only catalog shared by every request
//! - `error.rs` - Loader error taxonomy
//!
//! ## Adding a New Tool
//!
//! 1. Create a directory under the tool source root with a `plugin.json`
//! 2. Optionally add `ui.json` and `schema.json`
//! 3. Register a capability for its slug in `CapabilityTable::builtin()`
//!    (without one the tool is listed but not routable)

mod error;
pub mod loader;
pub mod locale;
mod registry;
mod types;

pub use error::LoadError;
pub use loader::{LoadReport, PluginLoader};
pub use locale::{LocalizedTree, negotiate, resolve, resolve_text};
pub use registry::Registry;
pub use types::{
    ChoiceSpec, OptionKind, OptionSpec, Plugin, ToolDescriptor, ToolSchema, UploadSpec, route_path,
};

#[cfg(test)]
pub(crate) use registry::tests::plugin as test_plugin;
