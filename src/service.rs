//! The monitoring session: lifecycle control and the per-transaction
//! pipeline (decode → enrich → persist → notify).
//!
//! One session at a time; transactions are processed to completion in
//! arrival order. All per-transaction errors are isolated — nothing here
//! can abort the subscription loop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::decoder;
use crate::notifier::{self, Notifier};
use crate::pool;
use crate::resolver::TokenResolver;
use crate::stats::{PipelineStats, StatsSnapshot};
use crate::storage::SwapStore;
use crate::stream;
use crate::types::{RawTransaction, SwapEvent, TokenInfo};

/// Owns every pipeline collaborator plus the session stop signal.
pub struct MonitorService {
    config: MonitorConfig,
    stats: PipelineStats,
    resolver: TokenResolver,
    store: SwapStore,
    notifier: Notifier,
    session: Mutex<Option<CancellationToken>>,
}

impl MonitorService {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let resolver = TokenResolver::with_defaults(
            config.token_cache_size,
            config.provider_timeout_seconds,
        );
        let store = SwapStore::new(
            &config.redis_url,
            &config.swap_list_key,
            config.max_stored_swaps,
            Duration::from_secs(config.store_timeout_seconds),
        )?;
        let notifier = Notifier::new(
            &config.telegram_api_base,
            &config.telegram_bot_token,
            &config.telegram_chat_id,
        );
        Ok(Self {
            config,
            stats: PipelineStats::new(),
            resolver,
            store,
            notifier,
            session: Mutex::new(None),
        })
    }

    /// Start a monitoring session. Returns `false` if one is already live.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut session = self.session.lock().expect("session lock poisoned");
        if session.as_ref().is_some_and(|t| !t.is_cancelled()) {
            return false;
        }

        let token = CancellationToken::new();
        *session = Some(token.clone());

        // Each session reports its own counters and uptime.
        self.stats.reset();

        let service = Arc::clone(self);
        tokio::spawn(async move {
            info!("monitoring session starting");
            service.notifier.send(&notifier::startup_message()).await;
            stream::run_feed(
                &service.config.websocket_url,
                &service.config.pending_tx_subscription,
                Arc::clone(&service),
                token,
            )
            .await;
            info!("monitoring session ended");
        });
        true
    }

    /// Stop the running session. Returns `false` if none was running.
    pub async fn stop(&self) -> bool {
        let token = self
            .session
            .lock()
            .expect("session lock poisoned")
            .take();

        match token {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                let summary = notifier::shutdown_message(&self.stats.snapshot());
                self.notifier.send(&summary).await;
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .expect("session lock poisoned")
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The most recent `limit` persisted swap events, newest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<SwapEvent>> {
        self.store.recent(limit).await
    }

    /// Deliver the fixed test message through the channel.
    pub async fn send_test_notification(&self) -> bool {
        self.notifier.send(&notifier::test_message()).await
    }

    /// Process one raw transaction to completion. Returns the finalized
    /// event when the transaction was a recognized swap.
    pub(crate) async fn process_transaction(&self, raw: RawTransaction) -> Option<SwapEvent> {
        self.stats.record_observed();

        let mut event = decoder::decode_transaction(&raw)?;

        // Enrichment. Failures degrade to placeholders; the event always
        // reaches the formatter with swap_type set.
        let token_info = match event.token_address {
            Some(addr) => self.resolver.resolve(&format!("0x{}", hex::encode(addr))).await,
            None => TokenInfo::unknown("unknown"),
        };
        event.token_symbol = Some(token_info.symbol.clone());
        event.token_name = Some(token_info.name.clone());
        event.pool_address = event.token_address.and_then(pool::derive_pair_address);

        if let Err(e) = self.store.insert(&event).await {
            warn!(error = %e, tx = %event.tx_hash, "failed to persist swap event");
        }

        let delivered = self.notifier.notify_swap(&event, &token_info).await;
        if delivered {
            self.stats.record_notification();
            self.stats.record_success();
            info!(
                tx = %event.tx_hash,
                swap_type = event.kind.label(),
                token = %token_info.symbol,
                "processed swap"
            );
        } else {
            self.stats.record_failure();
        }

        Some(event)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
