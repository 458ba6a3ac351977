//! Configuration for the mempool monitor binary.
//!
//! Loads from environment variables with sensible defaults. Secrets
//! (feed URL, Telegram credentials) have no defaults and are required.

use anyhow::{Context, Result};

/// Runtime configuration for the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// WebSocket URL of the pending-transaction feed.
    pub websocket_url: String,
    /// Subscription parameter for `eth_subscribe`.
    pub pending_tx_subscription: String,
    /// Telegram bot token.
    pub telegram_bot_token: String,
    /// Telegram chat id notifications are addressed to.
    pub telegram_chat_id: String,
    /// Telegram API base, overridable for tests.
    pub telegram_api_base: String,
    /// Redis connection URL.
    pub redis_url: String,
    /// Redis list key holding recent swap events.
    pub swap_list_key: String,
    /// Maximum number of swap events retained in the store.
    pub max_stored_swaps: usize,
    /// Connect and per-command timeout for the swap store (seconds).
    pub store_timeout_seconds: u64,
    /// Per-call timeout for metadata provider requests (seconds).
    pub provider_timeout_seconds: u64,
    /// Token metadata cache capacity.
    pub token_cache_size: usize,
    /// Bind address for the HTTP control surface.
    pub bind_addr: String,
    /// Comma-separated allowed CORS origins, `*` for any.
    pub cors_origins: String,
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Result<Self> {
        let websocket_url = std::env::var("ETH_WS_URL")
            .or_else(|_| std::env::var("ALCHEMY_WSS_URL"))
            .context("ETH_WS_URL (or ALCHEMY_WSS_URL) must be set")?;

        let telegram_bot_token =
            std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let telegram_chat_id =
            std::env::var("TELEGRAM_CHAT_ID").context("TELEGRAM_CHAT_ID must be set")?;

        Ok(Self {
            websocket_url,
            pending_tx_subscription: env_or("PENDING_TX_SUBSCRIPTION", "alchemy_pendingTransactions"),
            telegram_bot_token,
            telegram_chat_id,
            telegram_api_base: env_or("TELEGRAM_API_BASE", "https://api.telegram.org"),
            redis_url: env_or("REDIS_URL", "redis://localhost:6379"),
            swap_list_key: env_or("SWAP_LIST_KEY", "mempool:recent_swaps"),
            max_stored_swaps: env_parse("MAX_STORED_SWAPS").unwrap_or(1000),
            store_timeout_seconds: env_parse("STORE_TIMEOUT_SECONDS").unwrap_or(5),
            provider_timeout_seconds: env_parse("PROVIDER_TIMEOUT_SECONDS").unwrap_or(3),
            token_cache_size: env_parse("TOKEN_CACHE_SIZE").unwrap_or(10_000),
            bind_addr: env_or("MONITOR_BIND_ADDR", "0.0.0.0:8001"),
            cors_origins: env_or("CORS_ORIGINS", "*"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable into a type that implements `FromStr`.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}
