//! Plugin discovery and loading.
//!
//! Each immediate subdirectory of the tool source root is a candidate tool:
//!
//! ```text
//! plugins/
//! ├── pdf-merge/
//! │   ├── plugin.json   (required descriptor)
//! │   ├── ui.json       (optional localized metadata)
//! │   └── schema.json   (optional upload/options schema)
//! └── image-resize/
//!     └── plugin.json
//! ```
//!
//! Candidates are loaded independently. A broken descriptor excludes only that
//! tool; broken metadata or schema degrade to empty values; a missing
//! capability leaves the tool display-only. Only an unreadable source root
//! fails discovery as a whole.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::LoadError;
use super::locale::LocalizedTree;
use super::registry::Registry;
use super::types::{Plugin, ToolDescriptor, ToolSchema, route_path};
use crate::core::security::ensure_within_root;
use crate::domains::capabilities::CapabilityTable;

/// Required descriptor file name.
pub const DESCRIPTOR_FILE: &str = "plugin.json";

/// Optional localized metadata file name.
pub const METADATA_FILE: &str = "ui.json";

/// Optional schema file name.
pub const SCHEMA_FILE: &str = "schema.json";

/// Categories that would shadow the fixed API routes.
const RESERVED_CATEGORIES: &[&str] = &["plugins", "health"];

/// Per-tool issues collected during a discovery run.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub issues: Vec<LoadError>,
}

impl LoadReport {
    /// Issues that caused a tool to be excluded.
    pub fn excluded(&self) -> impl Iterator<Item = &LoadError> {
        self.issues.iter().filter(|e| !e.tool_admitted())
    }

    fn record(&mut self, issue: LoadError) {
        warn!("{}", issue);
        self.issues.push(issue);
    }
}

/// Scans a tool source root and builds the registry.
pub struct PluginLoader {
    root: PathBuf,
    capabilities: CapabilityTable,
}

impl PluginLoader {
    pub fn new(root: impl Into<PathBuf>, capabilities: CapabilityTable) -> Self {
        Self {
            root: root.into(),
            capabilities,
        }
    }

    /// Discover all tools and build the registry.
    pub fn discover(&self) -> Result<Registry, LoadError> {
        self.discover_with_report().map(|(registry, _)| registry)
    }

    /// Discover all tools, also returning every per-tool issue encountered.
    pub fn discover_with_report(&self) -> Result<(Registry, LoadReport), LoadError> {
        let root = self.root.canonicalize().map_err(|e| self.root_unavailable(e))?;
        if !root.is_dir() {
            return Err(self.root_unavailable(io::Error::new(
                io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }

        let mut candidates: Vec<(String, PathBuf)> = fs::read_dir(&root)
            .map_err(|e| self.root_unavailable(e))?
            .filter_map(|entry| match entry {
                Ok(entry) => Some((entry.file_name().to_string_lossy().into_owned(), entry.path())),
                Err(e) => {
                    warn!("Failed to read entry in {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|(name, path)| !name.starts_with('.') && path.is_dir())
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = LoadReport::default();
        let mut plugins = Vec::new();
        let mut claimed: HashMap<(String, String), String> = HashMap::new();

        for (name, path) in candidates {
            let dir = match ensure_within_root(&path, &root) {
                Ok(dir) => dir,
                Err(e) => {
                    report.record(LoadError::descriptor_invalid(&name, e.to_string()));
                    continue;
                }
            };

            let descriptor = match load_descriptor(&dir, &name) {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    report.record(e);
                    continue;
                }
            };

            // Slugs are unique within a category; the route is /api/<category>/<slug>.
            let key = (descriptor.category.clone(), descriptor.slug.clone());
            if let Some(existing) = claimed.get(&key) {
                report.record(LoadError::DuplicateTool {
                    category: descriptor.category,
                    slug: descriptor.slug,
                    dir: name,
                    existing: existing.clone(),
                });
                continue;
            }
            claimed.insert(key, name.clone());

            let plugin = self.load_candidate(descriptor, &dir, &name, &mut report);

            info!(
                plugin = %plugin.slug(),
                category = %plugin.category(),
                routable = plugin.is_routable(),
                "Loaded plugin from {}",
                name
            );
            plugins.push(plugin);
        }

        let registry = Registry::new(plugins);
        info!(
            "Discovered {} plugins ({} routable, {} issues) in {}",
            registry.len(),
            registry.routable().count(),
            report.issues.len(),
            root.display()
        );

        Ok((registry, report))
    }

    /// Read the optional files of an admitted tool and resolve its capability.
    fn load_candidate(
        &self,
        descriptor: ToolDescriptor,
        dir: &Path,
        name: &str,
        report: &mut LoadReport,
    ) -> Plugin {
        let ui = match read_optional::<LocalizedTree>(&dir.join(METADATA_FILE)) {
            Ok(ui) => ui.unwrap_or_default(),
            Err(reason) => {
                report.record(LoadError::MetadataInvalid {
                    dir: name.to_string(),
                    reason,
                });
                LocalizedTree::default()
            }
        };

        let schema = match read_optional::<ToolSchema>(&dir.join(SCHEMA_FILE)) {
            Ok(schema) => schema.unwrap_or_default(),
            Err(reason) => {
                report.record(LoadError::SchemaInvalid {
                    dir: name.to_string(),
                    reason,
                });
                ToolSchema::default()
            }
        };

        let capability = match self.capabilities.resolve(&descriptor.slug) {
            Ok(capability) => Some(capability),
            Err(e) => {
                report.record(LoadError::CapabilityUnresolvable {
                    slug: descriptor.slug.clone(),
                    reason: e.to_string(),
                });
                None
            }
        };

        Plugin {
            descriptor,
            ui,
            schema,
            capability,
            source_name: name.to_string(),
        }
    }

    fn root_unavailable(&self, source: io::Error) -> LoadError {
        LoadError::SourceRootUnavailable {
            path: self.root.clone(),
            source,
        }
    }
}

/// Read and validate the descriptor of one tool directory.
pub fn load_descriptor(dir: &Path, name: &str) -> Result<ToolDescriptor, LoadError> {
    let path = dir.join(DESCRIPTOR_FILE);
    let mut descriptor: ToolDescriptor = match read_optional(&path) {
        Ok(Some(descriptor)) => descriptor,
        Ok(None) => {
            return Err(LoadError::DescriptorMissing {
                dir: name.to_string(),
            });
        }
        Err(reason) => return Err(LoadError::descriptor_invalid(name, reason)),
    };

    validate_segment("slug", &descriptor.slug).map_err(|r| LoadError::descriptor_invalid(name, r))?;
    validate_segment("category", &descriptor.category)
        .map_err(|r| LoadError::descriptor_invalid(name, r))?;
    if RESERVED_CATEGORIES.contains(&descriptor.category.as_str()) {
        return Err(LoadError::descriptor_invalid(
            name,
            format!("category '{}' is reserved", descriptor.category),
        ));
    }

    if descriptor.api_path.trim().is_empty() {
        descriptor.api_path = route_path(&descriptor.category, &descriptor.slug);
    }

    Ok(descriptor)
}

/// Slugs and categories become URL path segments.
fn validate_segment(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "{} '{}' may only contain ASCII letters, digits, '-' and '_'",
            field, value
        ));
    }
    Ok(())
}

/// Parse a JSON file, treating a missing file as `None`.
fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("failed to read {}: {}", path.display(), e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| format!("failed to parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::capabilities::{
        CapabilityError, CapabilityOutput, CapabilityRequest, FnCapability,
    };
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_tool(root: &Path, dir: &str, files: &[(&str, &str)]) {
        let tool_dir = root.join(dir);
        fs::create_dir_all(&tool_dir).unwrap();
        for (name, content) in files {
            fs::write(tool_dir.join(name), content).unwrap();
        }
    }

    fn descriptor(slug: &str, category: &str, order: i64) -> String {
        json!({"slug": slug, "category": category, "apiPath": format!("/api/{}/{}", category, slug), "order": order})
            .to_string()
    }

    fn table_with(slugs: &[&str]) -> CapabilityTable {
        slugs.iter().fold(CapabilityTable::new(), |table, slug| {
            table.with(
                *slug,
                Arc::new(FnCapability::new(*slug, |_req: CapabilityRequest| {
                    async { Ok::<_, CapabilityError>(CapabilityOutput::Json(json!({}))) }.boxed()
                })),
            )
        })
    }

    fn slugs(registry: &Registry) -> Vec<String> {
        registry.iter().map(|p| p.slug().to_string()).collect()
    }

    #[test]
    fn test_broken_descriptor_is_excluded() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "a", &[(DESCRIPTOR_FILE, &descriptor("a", "pdf", 1))]);
        write_tool(root.path(), "b", &[(DESCRIPTOR_FILE, "{ not json")]);
        write_tool(root.path(), "c", &[(DESCRIPTOR_FILE, &descriptor("c", "pdf", 2))]);

        let loader = PluginLoader::new(root.path(), CapabilityTable::new());
        let (registry, report) = loader.discover_with_report().unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(slugs(&registry), vec!["a", "c"]);
        assert!(report
            .excluded()
            .any(|e| matches!(e, LoadError::DescriptorInvalid { dir, .. } if dir == "b")));
    }

    #[test]
    fn test_missing_descriptor_is_excluded() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "orphan", &[(METADATA_FILE, "{}")]);

        let (registry, report) = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover_with_report()
            .unwrap();

        assert!(registry.is_empty());
        assert!(matches!(report.issues[0], LoadError::DescriptorMissing { .. }));
    }

    #[test]
    fn test_descriptor_only_gets_empty_defaults() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "bare", &[(DESCRIPTOR_FILE, &descriptor("bare", "pdf", 1))]);

        let registry = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover()
            .unwrap();
        let plugin = registry.get_by_slug("bare").unwrap();

        assert!(plugin.ui.is_empty());
        assert!(plugin.schema.options.is_empty());
        assert_eq!(plugin.schema.upload, Default::default());
        assert!(!plugin.is_routable());
    }

    #[test]
    fn test_invalid_metadata_and_schema_degrade() {
        let root = TempDir::new().unwrap();
        write_tool(
            root.path(),
            "degraded",
            &[
                (DESCRIPTOR_FILE, &descriptor("degraded", "pdf", 1)),
                (METADATA_FILE, "[broken"),
                (SCHEMA_FILE, r#"{"upload": {"multiple": "yes please"}}"#),
            ],
        );

        let (registry, report) = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover_with_report()
            .unwrap();

        let plugin = registry.get_by_slug("degraded").unwrap();
        assert!(plugin.ui.is_empty());
        assert_eq!(plugin.schema, ToolSchema::default());
        assert!(report.issues.iter().any(|e| matches!(e, LoadError::MetadataInvalid { .. })));
        assert!(report.issues.iter().any(|e| matches!(e, LoadError::SchemaInvalid { .. })));
        assert_eq!(report.excluded().count(), 0);
    }

    #[test]
    fn test_deterministic_order() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "x-pdf", &[(DESCRIPTOR_FILE, &descriptor("pdf-five", "pdf", 5))]);
        write_tool(root.path(), "y-img", &[(DESCRIPTOR_FILE, &descriptor("img-two", "image", 2))]);
        write_tool(root.path(), "z-img", &[(DESCRIPTOR_FILE, &descriptor("img-one", "image", 1))]);

        let registry = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover()
            .unwrap();

        assert_eq!(slugs(&registry), vec!["img-one", "img-two", "pdf-five"]);
    }

    #[test]
    fn test_capability_resolution() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "merge", &[(DESCRIPTOR_FILE, &descriptor("pdf-merge", "pdf", 1))]);
        write_tool(root.path(), "split", &[(DESCRIPTOR_FILE, &descriptor("pdf-split", "pdf", 2))]);

        let (registry, report) = PluginLoader::new(root.path(), table_with(&["pdf-merge"]))
            .discover_with_report()
            .unwrap();

        assert!(registry.get_by_slug("pdf-merge").unwrap().is_routable());
        assert!(!registry.get_by_slug("pdf-split").unwrap().is_routable());
        assert!(report.issues.iter().any(
            |e| matches!(e, LoadError::CapabilityUnresolvable { slug, .. } if slug == "pdf-split")
        ));
    }

    #[test]
    fn test_duplicate_slug_within_category_keeps_first() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "first", &[(DESCRIPTOR_FILE, &descriptor("dup", "pdf", 1))]);
        write_tool(root.path(), "second", &[(DESCRIPTOR_FILE, &descriptor("dup", "pdf", 2))]);

        let (registry, report) = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover_with_report()
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_by_slug("dup").unwrap().source_name, "first");
        // Excluded duplicates are not resolved, so they report exactly one issue.
        let second: Vec<_> = report
            .issues
            .iter()
            .filter(|e| matches!(e, LoadError::DuplicateTool { dir, .. } if dir == "second"))
            .collect();
        assert_eq!(second.len(), 1);
        assert_eq!(
            report
                .issues
                .iter()
                .filter(|e| matches!(e, LoadError::CapabilityUnresolvable { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_same_slug_in_other_category_is_admitted() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "a", &[(DESCRIPTOR_FILE, &descriptor("compress", "pdf", 1))]);
        write_tool(root.path(), "b", &[(DESCRIPTOR_FILE, &descriptor("compress", "image", 1))]);

        let (registry, report) = PluginLoader::new(root.path(), table_with(&["compress"]))
            .discover_with_report()
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.categories(), vec!["image", "pdf"]);
        assert_eq!(registry.routable().count(), 2);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        // Lookup by slug alone returns the first tool in catalog order.
        assert_eq!(registry.get_by_slug("compress").unwrap().category(), "image");
    }

    #[test]
    fn test_descriptor_validation() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), "slash", &[(DESCRIPTOR_FILE, &descriptor("a/b", "pdf", 1))]);
        write_tool(root.path(), "reserved", &[(DESCRIPTOR_FILE, &descriptor("x", "plugins", 1))]);
        write_tool(root.path(), "empty", &[(DESCRIPTOR_FILE, &descriptor("", "pdf", 1))]);

        let (registry, report) = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover_with_report()
            .unwrap();

        assert!(registry.is_empty());
        assert_eq!(report.excluded().count(), 3);
    }

    #[test]
    fn test_api_path_defaults_to_route() {
        let root = TempDir::new().unwrap();
        write_tool(
            root.path(),
            "resize",
            &[(DESCRIPTOR_FILE, r#"{"slug": "image-resize", "category": "image"}"#)],
        );

        let registry = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover()
            .unwrap();
        assert_eq!(
            registry.get_by_slug("image-resize").unwrap().descriptor.api_path,
            "/api/image/image-resize"
        );
    }

    #[test]
    fn test_skips_hidden_dirs_and_files() {
        let root = TempDir::new().unwrap();
        write_tool(root.path(), ".cache", &[(DESCRIPTOR_FILE, &descriptor("hidden", "pdf", 1))]);
        fs::write(root.path().join("README.md"), "not a tool").unwrap();

        let (registry, report) = PluginLoader::new(root.path(), CapabilityTable::new())
            .discover_with_report()
            .unwrap();
        assert!(registry.is_empty());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let root = TempDir::new().unwrap();
        let loader = PluginLoader::new(root.path().join("nope"), CapabilityTable::new());
        assert!(matches!(
            loader.discover(),
            Err(LoadError::SourceRootUnavailable { .. })
        ));
    }

    #[test]
    fn test_shipped_tools_load_cleanly() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("plugins");
        let table = table_with(&CapabilityTable::builtin().slugs());

        let (registry, report) = PluginLoader::new(&root, table)
            .discover_with_report()
            .unwrap();

        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.routable().count(), 7);
        assert_eq!(registry.categories(), vec!["image", "pdf"]);
        assert!(registry
            .get_by_slug("pdf-merge")
            .unwrap()
            .schema
            .upload
            .multiple);
        for plugin in registry.iter() {
            for key in ["title", "h1", "description", "icon", "faq", "categoryName"] {
                assert!(plugin.ui.get(key).is_some(), "{} lacks {}", plugin.slug(), key);
            }
        }
    }
}
