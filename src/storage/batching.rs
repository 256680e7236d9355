//! Batch formation for the storage writer
//!
//! Batches form by sequential availability: once the queue reports an
//! entry, the writer takes what is ready up to the record and byte
//! bounds. There are no timers and no adaptive sizing.

use crate::queue::{QueueConsumer, QueueEntry};

/// Bounds on one storage commit.
///
/// Both bounds are at least 1, so every non-empty queue yields a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    max_records: usize,
    max_bytes: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_records: 64,
            max_bytes: 1024 * 1024,
        }
    }
}

impl BatchPolicy {
    pub fn new(max_records: usize, max_bytes: usize) -> Self {
        Self {
            max_records: max_records.max(1),
            max_bytes: max_bytes.max(1),
        }
    }

    /// Maximum entries per commit
    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// Soft cap on key plus value bytes per commit. A single entry larger
    /// than this still forms a batch of one.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// One entry per commit
    pub fn unbatched() -> Self {
        Self::new(1, usize::MAX)
    }

    /// Dequeues ready entries into `batch` until a bound is reached or
    /// nothing more is ready. Returns the number taken.
    pub fn fill<K, V>(
        &self,
        consumer: &mut QueueConsumer<K, V>,
        batch: &mut Vec<QueueEntry<K, V>>,
    ) -> usize {
        let mut bytes = 0usize;
        let mut taken = 0usize;
        while taken < self.max_records {
            let entry = match consumer.dequeue() {
                Some(entry) => entry,
                None => break,
            };
            bytes = bytes.saturating_add(entry.key_len() + entry.value_len());
            batch.push(entry);
            taken += 1;
            if bytes >= self.max_bytes {
                break;
            }
        }
        taken
    }
}
