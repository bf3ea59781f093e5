//! Multi-tenant gateway (v1)
//!
//! Runs request environment resolution as the first pipeline stage and
//! echoes the result.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout ─▶ environment ─▶ echo
//!                                                       middleware     handler
//!                                                           │
//!                                              routing (route's raw rules)
//!                                                           │
//!                                              EnvironmentResolver
//!                                              host → header → path
//!                                                           │
//!                                              Attributes[ARCHURA_REQUEST_ENVIRONMENT]
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use env_gateway::config::{load_config, GatewayConfig};
use env_gateway::lifecycle::{signals, Shutdown};
use env_gateway::observability::{logging, metrics};
use env_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "env-gateway")]
#[command(about = "Gateway that resolves the request environment", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "ENV_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("env-gateway v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        default_environment = %config.resolver.default_environment,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_on_signal(&shutdown).await;
    });

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
