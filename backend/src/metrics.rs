//! Counters for the oracle node.
//!
//! All counters are backed by atomics for lock-free concurrent access.

use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregated metrics for the oracle node.
///
/// Thread-safe via atomics; cloneable via `Arc<Metrics>`.
pub struct Metrics {
    /// Total number of requests picked up for this node's identities.
    pub requests_received: AtomicU64,
    /// Total number of requests fulfilled on the ledger.
    pub requests_fulfilled: AtomicU64,
    /// Total number of fulfillment attempts that failed after all retries.
    pub requests_failed: AtomicU64,
    /// Requests skipped because the ledger rejected them permanently
    /// (already fulfilled, wrong authority, unknown id).
    pub requests_rejected: AtomicU64,
    /// Sum of fulfillment latencies in milliseconds (for computing average).
    pub fulfillment_latency_sum_ms: AtomicU64,
}

impl Metrics {
    /// Create a new zeroed metrics instance.
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            requests_fulfilled: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            fulfillment_latency_sum_ms: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful fulfillment with its latency.
    pub fn record_fulfillment(&self, latency_ms: u64) {
        self.requests_fulfilled.fetch_add(1, Ordering::Relaxed);
        self.fulfillment_latency_sum_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Compute average fulfillment latency in milliseconds, or 0 if none.
    pub fn avg_latency_ms(&self) -> u64 {
        let count = self.requests_fulfilled.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.fulfillment_latency_sum_ms.load(Ordering::Relaxed) / count
    }

    /// Serialize metrics as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests_received": self.requests_received.load(Ordering::Relaxed),
            "requests_fulfilled": self.requests_fulfilled.load(Ordering::Relaxed),
            "requests_failed": self.requests_failed.load(Ordering::Relaxed),
            "requests_rejected": self.requests_rejected.load(Ordering::Relaxed),
            "avg_fulfillment_latency_ms": self.avg_latency_ms(),
            "total_fulfillment_latency_ms": self.fulfillment_latency_sum_ms.load(Ordering::Relaxed),
        })
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
