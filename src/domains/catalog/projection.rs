//! Projection of a plugin into a client-facing catalog entry.
//!
//! An entry is the descriptor fields, the tool's metadata resolved to one
//! language, and its schema with every label resolved to display text.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domains::plugins::{
    ChoiceSpec, OptionSpec, Plugin, ToolSchema, UploadSpec, resolve, resolve_text,
};

/// Icon used when a tool's metadata has none.
pub const DEFAULT_ICON: &str = "🔧";

/// Submit button text used when a schema has none.
pub const DEFAULT_SUBMIT_TEXT: &str = "Submit";

/// Entry keys owned by the projection; metadata cannot override them.
const RESERVED_KEYS: &[&str] = &[
    "slug", "category", "apiPath", "order", "icon", "routable", "schema",
];

/// One tool as served by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub slug: String,
    pub category: String,
    pub api_path: String,
    pub order: i64,
    /// Resolved metadata keys (`name`, `description`, `faq`, ...).
    #[serde(flatten)]
    pub ui: Map<String, Value>,
    pub icon: String,
    /// Whether POSTing to `apiPath` reaches a capability.
    pub routable: bool,
    pub schema: ProjectedSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedSchema {
    pub upload: UploadSpec,
    pub options: Vec<ProjectedOption>,
    pub submit_text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ProjectedChoice>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedChoice {
    pub value: Value,
    pub label: String,
}

/// Project a plugin into `lang`.
pub fn project(plugin: &Plugin, lang: &str) -> CatalogEntry {
    let ui = match resolve(&plugin.ui, lang) {
        Value::Object(map) => map
            .into_iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .collect(),
        _ => Map::new(),
    };

    CatalogEntry {
        slug: plugin.descriptor.slug.clone(),
        category: plugin.descriptor.category.clone(),
        api_path: plugin.descriptor.api_path.clone(),
        order: plugin.descriptor.order,
        ui,
        icon: resolve_text(plugin.ui.get("icon"), lang, DEFAULT_ICON),
        routable: plugin.is_routable(),
        schema: project_schema(&plugin.schema, lang),
    }
}

fn project_schema(schema: &ToolSchema, lang: &str) -> ProjectedSchema {
    ProjectedSchema {
        upload: schema.upload.clone(),
        options: schema
            .options
            .iter()
            .map(|option| project_option(option, lang))
            .collect(),
        submit_text: resolve_text(schema.submit_text.as_ref(), lang, DEFAULT_SUBMIT_TEXT),
        output_type: schema.output_type.clone(),
        extra: schema.extra.clone(),
    }
}

fn project_option(option: &OptionSpec, lang: &str) -> ProjectedOption {
    ProjectedOption {
        name: option.name.clone(),
        kind: option.kind.as_str().to_string(),
        label: resolve_text(option.label.as_ref(), lang, &option.name),
        default: option.default.clone(),
        choices: option.choices.as_ref().map(|choices| {
            choices
                .iter()
                .map(|choice| project_choice(choice, lang))
                .collect()
        }),
        extra: option.extra.clone(),
    }
}

fn project_choice(choice: &ChoiceSpec, lang: &str) -> ProjectedChoice {
    let raw = match &choice.value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ProjectedChoice {
        value: choice.value.clone(),
        label: resolve_text(choice.label.as_ref(), lang, &raw),
    }
}
