//! Running counters describing pipeline health.
//!
//! Only the pipeline task increments; status queries read concurrently.
//! Plain relaxed atomics are enough for the single-writer discipline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

/// Pipeline counters scoped to one monitoring session; starting a new
/// session resets them, so the shutdown summary reports that session only.
#[derive(Debug)]
pub struct PipelineStats {
    started_at: Mutex<Instant>,
    total_transactions: AtomicU64,
    successful_parses: AtomicU64,
    failed_parses: AtomicU64,
    notifications_sent: AtomicU64,
}

/// Point-in-time copy of the counters for status queries.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_transactions: u64,
    pub successful_parses: u64,
    pub failed_parses: u64,
    pub notifications_sent: u64,
    pub uptime_seconds: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self {
            started_at: Mutex::new(Instant::now()),
            total_transactions: AtomicU64::new(0),
            successful_parses: AtomicU64::new(0),
            failed_parses: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
        }
    }

    /// Zero every counter and restart the uptime clock for a new session.
    pub fn reset(&self) {
        self.total_transactions.store(0, Ordering::Relaxed);
        self.successful_parses.store(0, Ordering::Relaxed);
        self.failed_parses.store(0, Ordering::Relaxed);
        self.notifications_sent.store(0, Ordering::Relaxed);
        *self.started_at.lock().expect("stats clock lock poisoned") = Instant::now();
    }

    /// A transaction was read off the feed.
    pub fn record_observed(&self) {
        self.total_transactions.fetch_add(1, Ordering::Relaxed);
    }

    /// A decoded swap made it through enrichment and delivery.
    pub fn record_success(&self) {
        self.successful_parses.fetch_add(1, Ordering::Relaxed);
    }

    /// A decoded swap failed enrichment or delivery.
    pub fn record_failure(&self) {
        self.failed_parses.fetch_add(1, Ordering::Relaxed);
    }

    /// A notification was delivered.
    pub fn record_notification(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_transactions: self.total_transactions.load(Ordering::Relaxed),
            successful_parses: self.successful_parses.load(Ordering::Relaxed),
            failed_parses: self.failed_parses.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            uptime_seconds: self
                .started_at
                .lock()
                .expect("stats clock lock poisoned")
                .elapsed()
                .as_secs(),
        }
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
