//! HTTP transport implementation.
//!
//! Serves the router composed by [`ToolboxServer`] and stops accepting
//! connections on Ctrl-C, letting in-flight requests finish (and clean up
//! their staged uploads) before the process exits.

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{HttpConfig, TransportError};
use crate::core::{Result, ToolboxServer};

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Wrap the server's router with the transport-level layers.
    pub fn app(&self, server: &ToolboxServer) -> Router {
        let mut app = server.router().layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Run the HTTP transport until shutdown.
    pub async fn run(self, server: ToolboxServer) -> Result<()> {
        let addr = self.address();
        let app = self.app(&server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → Catalog: GET /api/plugins");
        info!("  → Health:  GET /api/health");
        for binding in server.routes() {
            info!("  → Tool:    POST {} ({})", binding.path, binding.discipline);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
