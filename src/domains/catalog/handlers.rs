//! Catalog HTTP handlers.
//!
//! - `GET /api/plugins?lang=&category=` lists every tool, plus the same
//!   entries grouped by category.
//! - `GET /api/plugins/{slug}?lang=` returns a single tool.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::error::CatalogError;
use super::projection::{CatalogEntry, project};
use crate::core::config::LocaleConfig;
use crate::core::transport::ApiResponse;
use crate::domains::plugins::{Registry, negotiate};

/// Shared state of the catalog routes.
#[derive(Debug, Clone)]
pub struct CatalogState {
    pub registry: Arc<Registry>,
    pub locale: LocaleConfig,
}

/// Query parameters accepted by the catalog endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub lang: Option<String>,
    pub category: Option<String>,
}

/// Build the catalog routes.
pub fn catalog_router(state: CatalogState) -> Router {
    Router::new()
        .route("/api/plugins", get(list_plugins))
        .route("/api/plugins/{slug}", get(get_plugin))
        .with_state(state)
}

#[instrument(skip(state))]
async fn list_plugins(
    State(state): State<CatalogState>,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let lang = negotiate(query.lang.as_deref(), &state.locale);

    let plugins: Vec<CatalogEntry> = match query.category.as_deref() {
        Some(category) => state
            .registry
            .get_by_category(category)
            .into_iter()
            .map(|plugin| project(plugin, &lang))
            .collect(),
        None => state
            .registry
            .iter()
            .map(|plugin| project(plugin, &lang))
            .collect(),
    };

    let mut categories: Map<String, Value> = Map::new();
    for entry in &plugins {
        let group = categories
            .entry(entry.category.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = group {
            items.push(json!(entry));
        }
    }

    debug!("Serving {} catalog entries in '{}'", plugins.len(), lang);
    ApiResponse::success(json!({
        "plugins": plugins,
        "categories": categories,
    }))
}

#[instrument(skip(state))]
async fn get_plugin(
    State(state): State<CatalogState>,
    Path(slug): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Result<ApiResponse, CatalogError> {
    let lang = negotiate(query.lang.as_deref(), &state.locale);
    let plugin = state
        .registry
        .get_by_slug(&slug)
        .ok_or(CatalogError::NotFound(slug))?;

    Ok(ApiResponse::success(json!(project(plugin, &lang))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::plugins::{LocalizedTree, test_plugin};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn state() -> CatalogState {
        let mut merge = test_plugin("pdf-merge", "pdf", 1);
        merge.ui = LocalizedTree::from(json!({"title": {"en": "Merge PDF", "zh": "合并 PDF"}}));
        let registry = Registry::new(vec![
            test_plugin("pdf-split", "pdf", 2),
            merge,
            test_plugin("image-resize", "image", 1),
        ]);
        CatalogState {
            registry: Arc::new(registry),
            locale: LocaleConfig::default(),
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = catalog_router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_groups_by_category() {
        let (status, body) = get_json("/api/plugins").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let slugs: Vec<&str> = body["data"]["plugins"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["image-resize", "pdf-merge", "pdf-split"]);

        let categories = body["data"]["categories"].as_object().unwrap();
        let keys: Vec<&String> = categories.keys().collect();
        assert_eq!(keys, vec!["image", "pdf"]);
        assert_eq!(categories["pdf"].as_array().unwrap().len(), 2);
        assert_eq!(categories["pdf"][0]["slug"], json!("pdf-merge"));
    }

    #[tokio::test]
    async fn test_list_resolves_language() {
        let (_, body) = get_json("/api/plugins?lang=zh-CN").await;
        assert_eq!(body["data"]["plugins"][1]["title"], json!("合并 PDF"));

        let (_, body) = get_json("/api/plugins?lang=fr").await;
        assert_eq!(body["data"]["plugins"][1]["title"], json!("Merge PDF"));
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let (_, body) = get_json("/api/plugins?category=image").await;
        assert_eq!(body["data"]["plugins"].as_array().unwrap().len(), 1);
        assert!(body["data"]["categories"].get("pdf").is_none());

        let (_, body) = get_json("/api/plugins?category=audio").await;
        assert!(body["data"]["plugins"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_single_plugin() {
        let (status, body) = get_json("/api/plugins/pdf-merge?lang=zh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["slug"], json!("pdf-merge"));
        assert_eq!(body["data"]["title"], json!("合并 PDF"));
        assert_eq!(body["data"]["icon"], json!("🔧"));
        assert_eq!(body["data"]["schema"]["submitText"], json!("Submit"));
    }

    #[tokio::test]
    async fn test_unknown_slug_is_404() {
        let (status, body) = get_json("/api/plugins/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"success": false, "message": "Plugin not found"})
        );
    }
}
