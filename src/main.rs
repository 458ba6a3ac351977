//! Mempool Monitor — Ethereum pending-transaction swap detector.
//!
//! Subscribes to a WebSocket pending-transaction feed, decodes Uniswap V2
//! router swap calldata, enriches each swap with token metadata and a
//! derived pool address, persists it, and sends a Telegram notification.
//! A small HTTP API starts/stops the session and reads statistics.

mod config;
mod constants;
mod decoder;
mod notifier;
mod pool;
mod resolver;
mod server;
mod service;
mod stats;
mod storage;
mod stream;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::MonitorConfig;
use crate::service::MonitorService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = MonitorConfig::from_env().context("failed to load monitor config")?;

    info!(
        ws_url = %config.websocket_url,
        bind = %config.bind_addr,
        redis = %config.redis_url,
        subscription = %config.pending_tx_subscription,
        "mempool monitor starting"
    );

    let bind_addr = config.bind_addr.clone();
    let cors_origins = config.cors_origins.clone();
    let service = Arc::new(MonitorService::new(config)?);
    let app = server::router(Arc::clone(&service), &cors_origins);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "control surface listening — press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("control surface server error")?;

    // Stop any live monitoring session before exit.
    if service.stop().await {
        info!("monitoring session stopped");
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
