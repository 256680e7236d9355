//! Metrics registry
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Relaxed atomics; safe to bump from a queue hook

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one database instance.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    writes_enqueued: AtomicU64,
    enqueue_rejected_full: AtomicU64,
    enqueue_rejected_flushed: AtomicU64,
    batches_committed: AtomicU64,
    entries_committed: AtomicU64,
    entries_rejected: AtomicU64,
    commit_retries: AtomicU64,
    commit_failures: AtomicU64,
    /// Key plus value bytes handed to the deallocators
    bytes_released: AtomicU64,
    queries_executed: AtomicU64,
    documents_scanned: AtomicU64,
    documents_matched: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Queue admission

    pub fn increment_writes_enqueued(&self) {
        self.writes_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Bumped from the queue's `on_full` hook
    pub fn increment_rejected_full(&self) {
        self.enqueue_rejected_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected_flushed(&self) {
        self.enqueue_rejected_flushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_released(&self, bytes: u64) {
        self.bytes_released.fetch_add(bytes, Ordering::Relaxed);
    }

    // Storage writer

    /// Bumped from the queue's `on_batch_flush` hook
    pub fn record_batch(&self, entries: u64) {
        self.batches_committed.fetch_add(1, Ordering::Relaxed);
        self.entries_committed.fetch_add(entries, Ordering::Relaxed);
    }

    pub fn add_entries_rejected(&self, entries: u64) {
        self.entries_rejected.fetch_add(entries, Ordering::Relaxed);
    }

    pub fn increment_commit_retries(&self) {
        self.commit_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commit_failures(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Reads

    pub fn record_query(&self, scanned: u64, matched: u64) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        self.documents_scanned.fetch_add(scanned, Ordering::Relaxed);
        self.documents_matched.fetch_add(matched, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes_enqueued: self.writes_enqueued.load(Ordering::Relaxed),
            enqueue_rejected_full: self.enqueue_rejected_full.load(Ordering::Relaxed),
            enqueue_rejected_flushed: self.enqueue_rejected_flushed.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            entries_committed: self.entries_committed.load(Ordering::Relaxed),
            entries_rejected: self.entries_rejected.load(Ordering::Relaxed),
            commit_retries: self.commit_retries.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
            bytes_released: self.bytes_released.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            documents_scanned: self.documents_scanned.load(Ordering::Relaxed),
            documents_matched: self.documents_matched.load(Ordering::Relaxed),
        }
    }

    /// Current snapshot rendered as a JSON object
    pub fn to_json(&self) -> String {
        self.snapshot().to_json()
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub writes_enqueued: u64,
    pub enqueue_rejected_full: u64,
    pub enqueue_rejected_flushed: u64,
    pub batches_committed: u64,
    pub entries_committed: u64,
    pub entries_rejected: u64,
    pub commit_retries: u64,
    pub commit_failures: u64,
    pub bytes_released: u64,
    pub queries_executed: u64,
    pub documents_scanned: u64,
    pub documents_matched: u64,
}

impl MetricsSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let registry = MetricsRegistry::new();
        registry.increment_writes_enqueued();
        registry.increment_writes_enqueued();
        registry.increment_rejected_full();
        registry.increment_rejected_flushed();
        registry.record_batch(5);
        registry.record_batch(2);
        registry.add_entries_rejected(1);
        registry.increment_commit_retries();
        registry.increment_commit_failures();
        registry.add_bytes_released(40);
        registry.record_query(10, 3);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.writes_enqueued, 2);
        assert_eq!(snapshot.enqueue_rejected_full, 1);
        assert_eq!(snapshot.enqueue_rejected_flushed, 1);
        assert_eq!(snapshot.batches_committed, 2);
        assert_eq!(snapshot.entries_committed, 7);
        assert_eq!(snapshot.entries_rejected, 1);
        assert_eq!(snapshot.commit_retries, 1);
        assert_eq!(snapshot.commit_failures, 1);
        assert_eq!(snapshot.bytes_released, 40);
        assert_eq!(snapshot.queries_executed, 1);
        assert_eq!(snapshot.documents_scanned, 10);
        assert_eq!(snapshot.documents_matched, 3);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.record_batch(3);

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["batches_committed"], 1);
        assert_eq!(parsed["entries_committed"], 3);
        assert_eq!(parsed["queries_executed"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        reg.increment_writes_enqueued();
                        reg.increment_rejected_full();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.writes_enqueued, 800);
        assert_eq!(snapshot.enqueue_rejected_full, 800);
    }
}
