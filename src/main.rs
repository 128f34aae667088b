//! HTTP gateway (edge-proxy)
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                     EDGE PROXY                       │
//!   Client Request    │  ┌─────────┐    ┌───────────┐    ┌───────────────┐   │
//!   ──────────────────┼─▶│  http   │───▶│  routing  │───▶│ load_balancer │   │
//!                     │  │ server  │    │ mappings  │    │  round robin  │   │
//!                     │  └─────────┘    └───────────┘    └───────┬───────┘   │
//!                     │                                          ▼           │
//!   Client Response   │  ┌─────────┐    ┌───────────┐    ┌───────────────┐   │
//!   ◀─────────────────┼──│ headers │◀───│interceptor│◀───│   forwarder   │◀──┼── Backend
//!                     │  │ strip   │    │           │    │ + upstream    │   │
//!                     │  └─────────┘    └───────────┘    └───────────────┘   │
//!                     │                                                      │
//!                     │  config (TOML, hot reload) · observability (hooks,   │
//!                     │  metrics, logging)                                   │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_proxy::config::{self, watcher::ConfigWatcher};
use edge_proxy::http::HttpServer;
use edge_proxy::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "edge-proxy", version, about = "HTTP gateway forwarding to mapped backends")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Disable reloading mappings when the config file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load_config(&args.config)?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        path = ?args.config,
        bind_address = %config.listener.bind_address,
        mappings = config.mappings.len(),
        balancer = ?config.balancer,
        "Configuration loaded"
    );

    if config.metrics.enabled {
        match config.metrics.address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.metrics.address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let (watcher, config_updates) = ConfigWatcher::new(&args.config);
    // Dropping the handle stops the watch; keep it for the server's lifetime.
    let _watch_handle = if args.no_watch {
        None
    } else {
        Some(watcher.run()?)
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
