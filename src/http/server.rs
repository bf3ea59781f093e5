//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run environment resolution as the first pipeline stage
//! - Bind server to listener and shut down gracefully

use axum::{middleware, routing::any, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::MemoryCache;
use crate::config::GatewayConfig;
use crate::context::Context;
use crate::environment::{EnvironmentResolver, ResolverSettings};
use crate::http::handlers::echo_handler;
use crate::http::middleware::environment_middleware;
use crate::routing::Router as RouteTable;

/// Application state injected into the pipeline.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<RouteTable>,
    pub resolver: Arc<EnvironmentResolver>,
    pub context: Context,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the default context.
    pub fn new(config: GatewayConfig) -> Self {
        let context = Context::default().with_cache(Arc::new(MemoryCache::new()));
        Self::with_context(config, context)
    }

    /// Create a new HTTP server with a caller-supplied context.
    pub fn with_context(config: GatewayConfig, context: Context) -> Self {
        let state = AppState {
            router: Arc::new(RouteTable::from_config(config.routes.clone())),
            resolver: Arc::new(EnvironmentResolver::new(ResolverSettings::from(
                &config.resolver,
            ))),
            context,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(echo_handler))
            .route("/", any(echo_handler))
            .layer(middleware::from_fn_with_state(state, environment_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
