//! Intercepting HTTP proxy (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request      ┌──────────────────────────────────────────────┐
//!   ───────────────────▶│ listener → MutableRequest → hook chain       │
//!                       │                               │              │
//!                       │              was_modified()?  ▼              │
//!                       │        original ◀── no ── yes ──▶ rebuilt    │
//!   Client Response     │                  │                  │        │
//!   ◀───────────────────│◀── hyper client ◀┴──────────────────┘        │──── Upstream
//!                       └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use intercept_proxy::config::{load_config, ProxyConfig};
use intercept_proxy::observability::logging::init_tracing;
use intercept_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "intercept-proxy")]
#[command(about = "HTTP proxy that lets hooks inspect and rewrite requests", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    init_tracing(&config.observability.log_level);
    tracing::info!("intercept-proxy v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rewrites = config.rewrites.len(),
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown.trigger_on_ctrl_c().await;
    });

    let server = HttpServer::from_config(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
