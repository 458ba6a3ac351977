//! WebSocket subscription to the pending-transaction feed.
//!
//! Connects, subscribes, and forwards each raw transaction into the
//! processing pipeline. Reconnects forever — 5 s after an orderly close,
//! 10 s after any other error — until the session stop signal fires.
//! Malformed frames are dropped without touching the connection.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use futures::{SinkExt, StreamExt};
use lru::LruCache;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::MonitorService;
use crate::types::RawTransaction;

/// Backoff after the server closes the connection in an orderly way.
const ORDERLY_CLOSE_DELAY: Duration = Duration::from_secs(5);
/// Backoff after any other connection failure.
const ERROR_DELAY: Duration = Duration::from_secs(10);
/// Capacity of the transaction-hash dedup cache.
const DEDUP_CACHE_SIZE: usize = 100_000;

/// How one connection attempt ended; the delay before the next attempt is
/// the transition data.
enum FeedOutcome {
    Stopped,
    ClosedByServer,
    Failed(anyhow::Error),
}

/// Run the feed loop until the session is cancelled. Never gives up on its
/// own — the operator stops the loop, not the retry counter.
pub async fn run_feed(
    url: &str,
    subscription: &str,
    service: Arc<MonitorService>,
    shutdown: CancellationToken,
) {
    let capacity = NonZeroUsize::new(DEDUP_CACHE_SIZE).expect("cache size is non-zero");
    let mut dedup: LruCache<B256, ()> = LruCache::new(capacity);
    let mut backoff: Option<Duration> = None;

    loop {
        if shutdown.is_cancelled() {
            info!("feed loop stop requested");
            return;
        }

        if let Some(delay) = backoff.take() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.cancelled() => return,
            }
        }

        info!(url = url, "connecting to pending-transaction feed");

        match subscribe_and_stream(url, subscription, &service, &mut dedup, &shutdown).await {
            FeedOutcome::Stopped => {
                info!("feed loop stopped cleanly");
                return;
            }
            FeedOutcome::ClosedByServer => {
                warn!(delay_secs = ORDERLY_CLOSE_DELAY.as_secs(), "feed closed, reconnecting");
                backoff = Some(ORDERLY_CLOSE_DELAY);
            }
            FeedOutcome::Failed(e) => {
                warn!(
                    error = %e,
                    delay_secs = ERROR_DELAY.as_secs(),
                    "feed error, reconnecting"
                );
                backoff = Some(ERROR_DELAY);
            }
        }
    }
}

/// Connect, subscribe, and process frames until disconnection or shutdown.
async fn subscribe_and_stream(
    url: &str,
    subscription: &str,
    service: &Arc<MonitorService>,
    dedup: &mut LruCache<B256, ()>,
    shutdown: &CancellationToken,
) -> FeedOutcome {
    let (ws_stream, _response) = match connect_async(url).await {
        Ok(ok) => ok,
        Err(e) => return FeedOutcome::Failed(e.into()),
    };
    let (mut write, mut read) = ws_stream.split();

    let subscribe_msg = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_subscribe",
        "params": [subscription],
    });
    if let Err(e) = write.send(Message::Text(subscribe_msg.to_string().into())).await {
        return FeedOutcome::Failed(e.into());
    }

    info!(subscription = subscription, "subscribed to pending transactions");

    let mut total_received = 0u64;
    let mut total_deduped = 0u64;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        total_received += 1;

                        if let Some(raw) = parse_frame(&text) {
                            if is_duplicate(&raw, dedup) {
                                total_deduped += 1;
                            } else {
                                let _ = service.process_transaction(raw).await;
                            }
                        }

                        if total_received % 10_000 == 0 {
                            info!(
                                received = total_received,
                                deduped = total_deduped,
                                "feed stats"
                            );
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        return FeedOutcome::ClosedByServer;
                    }
                    Some(Err(e)) => {
                        return FeedOutcome::Failed(e.into());
                    }
                    None => {
                        return FeedOutcome::Failed(anyhow::anyhow!("feed stream ended"));
                    }
                    _ => {} // Binary, Pong, Frame — ignore.
                }
            }
            _ = shutdown.cancelled() => {
                info!("shutdown requested, closing feed");
                return FeedOutcome::Stopped;
            }
        }
    }
}

/// Extract a raw transaction from a subscription notification frame.
///
/// Frames that are not well-formed notifications (invalid JSON, missing
/// `params.result`, or a non-object result such as the subscription ack)
/// yield `None` and are dropped silently.
pub(crate) fn parse_frame(text: &str) -> Option<RawTransaction> {
    let msg: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "dropping non-JSON frame");
            return None;
        }
    };

    let result = msg.get("params")?.get("result")?;
    if !result.is_object() {
        return None;
    }
    serde_json::from_value(result.clone()).ok()
}

/// Pending-transaction feeds redeliver; drop hashes seen recently.
fn is_duplicate(raw: &RawTransaction, dedup: &mut LruCache<B256, ()>) -> bool {
    let Ok(hash) = raw.hash.parse::<B256>() else {
        return false;
    };
    if dedup.contains(&hash) {
        return true;
    }
    dedup.put(hash, ());
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
