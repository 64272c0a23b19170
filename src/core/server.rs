//! Toolbox server assembly.
//!
//! Owns the immutable registry and the staging area, composes the dynamic
//! tool routes once, and exposes the full application router:
//!
//! - `GET /api/plugins`, `GET /api/plugins/{slug}` - catalog
//! - `GET /api/health` - liveness and counts
//! - `POST /api/{category}/{slug}` - one per routable tool
//!
//! Anything else gets a JSON 404 envelope.

use axum::{
    Json, Router,
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::config::Config;
use super::error::{Error, Result};
use super::transport::error_response;
use crate::domains::{
    capabilities::CapabilityTable,
    catalog::{CatalogState, catalog_router},
    plugins::{PluginLoader, Registry},
    routes::{RouteBinding, RouteComposer},
    uploads::StagingArea,
};

/// The assembled toolbox server.
#[derive(Clone, Debug)]
pub struct ToolboxServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Catalog of discovered tools, read-only after startup.
    registry: Arc<Registry>,

    /// Shared staging directory for uploads.
    staging: Arc<StagingArea>,

    /// Tool routes registered by the composer.
    routes: Vec<RouteBinding>,

    /// Router holding the tool routes.
    tool_router: Router,
}

impl ToolboxServer {
    /// Discover tools and prepare the staging area.
    ///
    /// Fails only when the tool source root is unreadable or the staging
    /// directory cannot be created. Per-tool problems are logged and skipped.
    pub fn bootstrap(config: Config, capabilities: CapabilityTable) -> Result<Self> {
        let loader = PluginLoader::new(&config.plugins.root_dir, capabilities);
        let (registry, report) = loader.discover_with_report()?;
        let excluded = report.excluded().count();
        if excluded > 0 {
            warn!("{} tool directories were excluded", excluded);
        }

        let server = Self::new(config, registry);
        let staging = server.staging();
        staging
            .prepare()
            .map_err(|e| Error::staging(staging.root(), e))?;

        Ok(server)
    }

    /// Create a server over an already discovered registry.
    #[instrument(skip_all, fields(plugins = registry.len()))]
    pub fn new(config: Config, registry: Registry) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(registry);
        let staging = Arc::new(StagingArea::new(&config.uploads.staging_dir));

        let composer = RouteComposer::new(config.uploads.clone(), Arc::clone(&staging));
        let (tool_router, routes) = composer.compose(&registry);

        info!(
            "Composed {} tool routes for {} plugins",
            routes.len(),
            registry.len()
        );

        Self {
            config,
            registry,
            staging,
            routes,
            tool_router,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn staging(&self) -> &Arc<StagingArea> {
        &self.staging
    }

    /// Tool routes in registration order.
    pub fn routes(&self) -> &[RouteBinding] {
        &self.routes
    }

    /// The full application router.
    pub fn router(&self) -> Router {
        let catalog = catalog_router(CatalogState {
            registry: Arc::clone(&self.registry),
            locale: self.config.locale.clone(),
        });

        let plugins = self.registry.len();
        let routes = self.routes.len();

        Router::new()
            .route("/api/health", get(move || health(plugins, routes)))
            .merge(catalog)
            .merge(self.tool_router.clone())
            .fallback(not_found)
    }
}

async fn health(plugins: usize, routes: usize) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "plugins": plugins,
        "routes": routes,
    }))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
