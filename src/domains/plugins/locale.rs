//! Locale resolution for tool metadata.
//!
//! Tool metadata is authored as a tree in which some objects are locale maps
//! (`{"en": "Merge PDF", "zh": "合并 PDF"}`) and others are plain structure
//! (`{"question": ..., "answer": ...}`). The two are told apart once, at parse
//! time, and carried as distinct variants of [`LocalizedTree`] so resolution
//! never has to guess from the requested language.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::config::LocaleConfig;

/// Language every locale map falls back to.
pub const FALLBACK_LANGUAGE: &str = "en";

/// A metadata tree whose locale maps are explicitly tagged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum LocalizedTree {
    /// String, number, boolean or null.
    Scalar(Value),
    /// Language tag -> value. Every key is a language tag.
    Localized(Vec<(String, LocalizedTree)>),
    /// Ordered list of subtrees.
    Sequence(Vec<LocalizedTree>),
    /// Plain object with arbitrary keys.
    Object(Vec<(String, LocalizedTree)>),
}

impl Default for LocalizedTree {
    fn default() -> Self {
        Self::Object(Vec::new())
    }
}

impl From<Value> for LocalizedTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                let is_locale_map = !map.is_empty() && map.keys().all(|k| is_language_tag(k));
                let entries = map.into_iter().map(|(k, v)| (k, Self::from(v))).collect();
                if is_locale_map {
                    Self::Localized(entries)
                } else {
                    Self::Object(entries)
                }
            }
            scalar => Self::Scalar(scalar),
        }
    }
}

impl LocalizedTree {
    /// A single-language shorthand, mostly useful when building trees in code.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Value::String(value.into()))
    }

    /// True for an empty structural object (the default for absent metadata).
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Object(entries) if entries.is_empty())
    }

    /// Look up a key of a structural object.
    pub fn get(&self, key: &str) -> Option<&LocalizedTree> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Whether `key` looks like a language tag: `en`, `zh`, `pt-BR`, `zh_Hans`.
pub fn is_language_tag(key: &str) -> bool {
    let mut parts = key.splitn(2, ['-', '_']);
    let primary = parts.next().unwrap_or_default();
    let primary_ok = primary.len() == 2
        && primary.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = match parts.next() {
        None => true,
        Some(region) => {
            (2..=4).contains(&region.len()) && region.chars().all(|c| c.is_ascii_alphanumeric())
        }
    };
    primary_ok && region_ok
}

/// Project `tree` onto a single language.
///
/// Locale maps collapse to the value for `lang`, then [`FALLBACK_LANGUAGE`].
/// Regional keys (`zh-TW`) answer for their language when no exact key exists.
/// A locale map with neither is emitted as an object of its resolved values.
pub fn resolve(tree: &LocalizedTree, lang: &str) -> Value {
    match tree {
        LocalizedTree::Scalar(value) => value.clone(),
        LocalizedTree::Sequence(items) => {
            Value::Array(items.iter().map(|item| resolve(item, lang)).collect())
        }
        LocalizedTree::Localized(entries) => {
            match pick(entries, lang).or_else(|| pick(entries, FALLBACK_LANGUAGE)) {
                Some(chosen) => resolve(chosen, lang),
                None => resolve_entries(entries, lang),
            }
        }
        LocalizedTree::Object(entries) => resolve_entries(entries, lang),
    }
}

/// Resolve `tree` to display text, or `default` when the result is not usable text.
pub fn resolve_text(tree: Option<&LocalizedTree>, lang: &str, default: &str) -> String {
    match tree.map(|t| resolve(t, lang)) {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

/// Normalize a requested language against the configured language list.
///
/// `zh-CN`, ` ZH ` and `zh_cn` all become `zh`. Unknown or absent languages
/// become the configured default. An empty language list accepts anything.
pub fn negotiate(requested: Option<&str>, config: &LocaleConfig) -> String {
    let normalized = requested
        .map(|raw| raw.trim().to_ascii_lowercase())
        .and_then(|raw| raw.split(['-', '_']).next().map(str::to_string))
        .filter(|lang| !lang.is_empty());

    match normalized {
        Some(lang) if config.languages.is_empty() || config.languages.contains(&lang) => lang,
        _ => config.default_lang.clone(),
    }
}

/// The entry for `lang`: an exact key first, then a regional key of the same language.
fn pick<'a>(entries: &'a [(String, LocalizedTree)], lang: &str) -> Option<&'a LocalizedTree> {
    entries
        .iter()
        .find(|(k, _)| k == lang)
        .or_else(|| entries.iter().find(|(k, _)| primary_subtag(k) == lang))
        .map(|(_, v)| v)
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

fn resolve_entries(entries: &[(String, LocalizedTree)], lang: &str) -> Value {
    let map: Map<String, Value> = entries
        .iter()
        .map(|(k, v)| (k.clone(), resolve(v, lang)))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> LocalizedTree {
        LocalizedTree::from(value)
    }

    fn locales() -> LocaleConfig {
        LocaleConfig {
            default_lang: "en".to_string(),
            languages: vec!["en".to_string(), "zh".to_string(), "es".to_string()],
        }
    }

    #[test]
    fn test_resolve_requested_language() {
        let t = tree(json!({"en": "Hello", "zh": "你好"}));
        assert_eq!(resolve(&t, "zh"), json!("你好"));
    }

    #[test]
    fn test_resolve_falls_back_to_english() {
        let t = tree(json!({"en": "Hello"}));
        assert_eq!(resolve(&t, "zh"), json!("Hello"));
    }

    #[test]
    fn test_resolve_regional_keys() {
        let t = tree(json!({"en-US": "Color", "zh-TW": "顏色"}));
        assert_eq!(resolve(&t, "zh"), json!("顏色"));
        assert_eq!(resolve(&t, "es"), json!("Color"));

        let exact_wins = tree(json!({"zh-TW": "顏色", "zh": "颜色"}));
        assert_eq!(resolve(&exact_wins, "zh"), json!("颜色"));
    }

    #[test]
    fn test_resolve_sequence_elementwise() {
        let t = tree(json!(["a", {"en": "x", "zh": "y"}]));
        assert_eq!(resolve(&t, "zh"), json!(["a", "y"]));
    }

    #[test]
    fn test_resolve_nested_structure() {
        let t = tree(json!({
            "title": {"en": "Merge", "es": "Unir"},
            "faq": {
                "en": [{"question": "Free?", "answer": "Yes"}],
                "es": [{"question": "¿Gratis?", "answer": "Sí"}]
            },
            "icon": "📄"
        }));
        assert_eq!(
            resolve(&t, "es"),
            json!({
                "title": "Unir",
                "faq": [{"question": "¿Gratis?", "answer": "Sí"}],
                "icon": "📄"
            })
        );
    }

    #[test]
    fn test_structural_object_with_en_key_is_not_collapsed() {
        let t = tree(json!({"en": "English label", "icon": "🔧"}));
        assert!(matches!(t, LocalizedTree::Object(_)));
        assert_eq!(
            resolve(&t, "zh"),
            json!({"en": "English label", "icon": "🔧"})
        );
    }

    #[test]
    fn test_locale_map_without_match_is_kept_as_object() {
        let t = tree(json!({"zh": "你好", "es": "Hola"}));
        assert!(matches!(t, LocalizedTree::Localized(_)));
        assert_eq!(resolve(&t, "fr"), json!({"zh": "你好", "es": "Hola"}));
    }

    #[test]
    fn test_scalars_unchanged() {
        assert_eq!(resolve(&tree(json!(42)), "zh"), json!(42));
        assert_eq!(resolve(&tree(json!(null)), "zh"), json!(null));
        assert_eq!(resolve(&tree(json!(true)), "zh"), json!(true));
    }

    #[test]
    fn test_empty_object_is_structural() {
        let t = tree(json!({}));
        assert!(t.is_empty());
        assert_eq!(resolve(&t, "en"), json!({}));
    }

    #[test]
    fn test_language_tags() {
        assert!(is_language_tag("en"));
        assert!(is_language_tag("zh-CN"));
        assert!(is_language_tag("pt_BR"));
        assert!(is_language_tag("zh-Hans"));
        assert!(!is_language_tag("icon"));
        assert!(!is_language_tag("EN"));
        assert!(!is_language_tag("e"));
        assert!(!is_language_tag("en-"));
        assert!(!is_language_tag("title"));
        assert!(!is_language_tag("faq"));
    }

    #[test]
    fn test_resolve_text_defaults() {
        let label = tree(json!({"zh": "宽度"}));
        assert_eq!(resolve_text(Some(&label), "zh", "width"), "宽度");
        assert_eq!(resolve_text(Some(&label), "es", "width"), "width");
        assert_eq!(resolve_text(None, "en", "Submit"), "Submit");
        assert_eq!(resolve_text(Some(&tree(json!({"en": ""}))), "en", "Submit"), "Submit");
        assert_eq!(resolve_text(Some(&tree(json!(90))), "en", "x"), "90");
    }

    #[test]
    fn test_negotiate_language() {
        let config = locales();
        assert_eq!(negotiate(Some("zh"), &config), "zh");
        assert_eq!(negotiate(Some(" ZH-cn "), &config), "zh");
        assert_eq!(negotiate(Some("es_MX"), &config), "es");
        assert_eq!(negotiate(Some("fr"), &config), "en");
        assert_eq!(negotiate(Some(""), &config), "en");
        assert_eq!(negotiate(None, &config), "en");
    }

    #[test]
    fn test_negotiate_without_language_list() {
        let config = LocaleConfig {
            default_lang: "en".to_string(),
            languages: Vec::new(),
        };
        assert_eq!(negotiate(Some("fr"), &config), "fr");
    }
}
