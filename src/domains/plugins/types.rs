//! Plugin data model: descriptors, schemas and the assembled `Plugin` record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::locale::LocalizedTree;
use crate::domains::capabilities::Capability;

/// Contents of a tool's required `plugin.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Identifier, unique across the catalog.
    pub slug: String,

    /// Grouping key, also the route prefix.
    pub category: String,

    /// Path clients should POST to. Filled from the derived route when absent.
    #[serde(default)]
    pub api_path: String,

    /// Sort key within the category.
    #[serde(default)]
    pub order: i64,
}

/// Upload constraints declared by a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSpec {
    pub multiple: bool,
    pub max_files: u32,
    pub types: Vec<String>,
    #[serde(alias = "maxSize")]
    pub max_size_bytes: u64,
}

/// Kind of a user-facing option field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptionKind {
    Text,
    Number,
    Select,
    Checkbox,
    Range,
    Other(String),
}

impl From<String> for OptionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => Self::Text,
            "number" => Self::Number,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "range" => Self::Range,
            _ => Self::Other(value),
        }
    }
}

impl From<OptionKind> for String {
    fn from(kind: OptionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl OptionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Range => "range",
            Self::Other(other) => other,
        }
    }
}

/// One selectable value of a `select` option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChoiceSpec {
    pub value: Value,
    #[serde(default)]
    pub label: Option<LocalizedTree>,
}

/// A form field the tool's capability expects alongside the upload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_option_kind")]
    pub kind: OptionKind,
    #[serde(default)]
    pub label: Option<LocalizedTree>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub choices: Option<Vec<ChoiceSpec>>,
    /// Renderer hints such as `min`, `max`, `step`, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_option_kind() -> OptionKind {
    OptionKind::Text
}

impl OptionSpec {
    /// The declared default rendered as a form value.
    pub fn default_as_form_value(&self) -> Option<String> {
        match self.default.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Contents of a tool's optional `schema.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSchema {
    pub upload: UploadSpec,
    pub options: Vec<OptionSpec>,
    pub submit_text: Option<LocalizedTree>,
    pub output_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolSchema {
    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// A tool admitted into the registry.
#[derive(Clone)]
pub struct Plugin {
    pub descriptor: ToolDescriptor,
    pub ui: LocalizedTree,
    pub schema: ToolSchema,
    /// Processing logic; `None` makes the tool display-only.
    pub capability: Option<Arc<dyn Capability>>,
    /// Name of the directory the tool was loaded from.
    pub source_name: String,
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("descriptor", &self.descriptor)
            .field("source_name", &self.source_name)
            .field("routable", &self.is_routable())
            .finish_non_exhaustive()
    }
}

impl Plugin {
    pub fn slug(&self) -> &str {
        &self.descriptor.slug
    }

    pub fn category(&self) -> &str {
        &self.descriptor.category
    }

    /// Whether a dynamic route should exist for this tool.
    pub fn is_routable(&self) -> bool {
        self.capability.is_some()
    }

    /// The POST path derived from `(category, slug)`.
    pub fn route_path(&self) -> String {
        route_path(&self.descriptor.category, &self.descriptor.slug)
    }
}

/// Derive the upload route for a tool.
pub fn route_path(category: &str, slug: &str) -> String {
    format!("/api/{}/{}", category, slug)
}
