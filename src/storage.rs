//! Redis-backed persistence for detected swap events.
//!
//! Events are LPUSHed as JSON onto a capped list, so index 0 is always the
//! most recent detection and retrieval is a single LRANGE.

use std::time::Duration;

use anyhow::{Context, Result};
use redis::AsyncCommands;
use tracing::warn;

use crate::types::SwapEvent;

/// Persistent store of recent swap events.
pub struct SwapStore {
    client: redis::Client,
    key: String,
    max_entries: usize,
    /// Connect and per-command deadline. A store that accepts TCP but stops
    /// answering must not stall the pipeline.
    timeout: Duration,
}

impl SwapStore {
    pub fn new(redis_url: &str, key: &str, max_entries: usize, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("invalid Redis URL")?;
        Ok(Self {
            client,
            key: key.to_string(),
            max_entries: max_entries.max(1),
            timeout,
        })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection_with_timeouts(self.timeout, self.timeout)
            .await
            .context("failed to connect to Redis")
    }

    /// Persist one event, trimming the list to its capacity.
    pub async fn insert(&self, event: &SwapEvent) -> Result<()> {
        let json = serde_json::to_string(event).context("failed to serialize swap event")?;
        let mut conn = self.connection().await?;

        let _: () = conn
            .lpush(&self.key, json)
            .await
            .context("LPUSH failed")?;
        let _: () = conn
            .ltrim(&self.key, 0, self.max_entries as isize - 1)
            .await
            .context("LTRIM failed")?;
        Ok(())
    }

    /// The most recent `limit` events, newest first. Entries that fail to
    /// parse are skipped rather than failing the query.
    pub async fn recent(&self, limit: usize) -> Result<Vec<SwapEvent>> {
        let mut conn = self.connection().await?;

        let raw: Vec<String> = conn
            .lrange(&self.key, 0, limit.max(1) as isize - 1)
            .await
            .context("LRANGE failed")?;

        let mut events = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_str::<SwapEvent>(&entry) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, "skipping unparseable stored event"),
            }
        }
        Ok(events)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawTransaction, SwapEvent, SwapKind};
    use rust_decimal_macros::dec;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn sample_event() -> SwapEvent {
        let raw = RawTransaction {
            hash: "0xaabbccddeeff00112233445566778899aabbccddeeff00112233445566778899"
                .to_string(),
            ..Default::default()
        };
        SwapEvent::new(&raw, SwapKind::Buy { amount: dec!(1) }, None)
    }

    #[tokio::test]
    async fn test_insert_errors_when_store_stops_responding() {
        // Accepts TCP and swallows every command without ever replying.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while socket.read(&mut buf).await.map(|n| n > 0).unwrap_or(false) {}
                });
            }
        });

        let store = SwapStore::new(
            &format!("redis://{addr}"),
            "test:swaps",
            10,
            Duration::from_millis(200),
        )
        .unwrap();

        let result =
            tokio::time::timeout(Duration::from_secs(5), store.insert(&sample_event())).await;
        assert!(result
            .expect("insert must return within its own deadline")
            .is_err());
    }

    #[tokio::test]
    async fn test_recent_errors_when_store_is_unreachable() {
        let store = SwapStore::new(
            "redis://127.0.0.1:1",
            "test:swaps",
            10,
            Duration::from_millis(200),
        )
        .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), store.recent(5)).await;
        assert!(result
            .expect("recent must return within its own deadline")
            .is_err());
    }
}
