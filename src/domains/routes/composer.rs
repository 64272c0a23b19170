//! Route composition.
//!
//! Walks the registry once at startup and registers one POST route per
//! routable tool, each with the upload discipline its schema selects.
//! Composition happens in two steps: [`RouteComposer::plan`] decides the
//! bindings, [`RouteComposer::compose`] turns them into an axum router.

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use std::sync::Arc;
use tracing::{info, warn};

use super::dispatch::{RouteContext, handle};
use crate::core::config::UploadsConfig;
use crate::domains::plugins::{Plugin, Registry};
use crate::domains::uploads::{StagingArea, UploadDiscipline};

/// One registered tool route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteBinding {
    pub path: String,
    pub slug: String,
    pub discipline: UploadDiscipline,
}

/// Builds the dynamic tool routes.
pub struct RouteComposer {
    limits: UploadsConfig,
    staging: Arc<StagingArea>,
}

impl RouteComposer {
    pub fn new(limits: UploadsConfig, staging: Arc<StagingArea>) -> Self {
        Self { limits, staging }
    }

    /// Decide the route for every routable plugin, in catalog order.
    pub fn plan(&self, registry: &Registry) -> Vec<RouteBinding> {
        registry
            .routable()
            .map(|plugin| self.binding_for(plugin))
            .collect()
    }

    /// Build the router for the planned bindings.
    ///
    /// Returns the bindings that were actually registered.
    pub fn compose(&self, registry: &Registry) -> (Router, Vec<RouteBinding>) {
        let mut router = Router::new();
        let mut bindings = Vec::new();

        for (plugin, binding) in registry.routable().zip(self.plan(registry)) {
            let Some(capability) = plugin.capability.clone() else {
                continue;
            };

            let declared = plugin.descriptor.api_path.as_str();
            if declared != binding.path {
                warn!(
                    plugin = %plugin.slug(),
                    "Declared apiPath {} differs from route {}; serving the route",
                    declared,
                    binding.path
                );
            }

            let context = Arc::new(RouteContext {
                plugin: Arc::clone(plugin),
                capability,
                discipline: binding.discipline,
                staging: Arc::clone(&self.staging),
            });

            router = router.route(
                &binding.path,
                post(handle)
                    .layer(DefaultBodyLimit::max(binding.discipline.body_limit()))
                    .with_state(context),
            );

            info!(
                "Registered route POST {} ({})",
                binding.path, binding.discipline
            );
            bindings.push(binding);
        }

        (router, bindings)
    }

    fn binding_for(&self, plugin: &Plugin) -> RouteBinding {
        RouteBinding {
            path: plugin.route_path(),
            slug: plugin.slug().to_string(),
            discipline: UploadDiscipline::select(&plugin.schema.upload, &self.limits),
        }
    }
}
