//! Queue entries

use std::fmt;

/// One submitted write, owned by whoever currently holds it.
///
/// Producers move payloads in through `WriteQueue::enqueue`; the consumer
/// receives the entry from `dequeue` and must hand it back through
/// `QueueConsumer::release`, which passes the payloads to the queue's
/// deallocators. There is no other way to take the payloads out, so an
/// entry cannot be released twice.
#[must_use = "dequeued entries must be handed back through QueueConsumer::release"]
pub struct QueueEntry<K, V> {
    pub(super) queue_id: u64,
    pub(super) key: K,
    pub(super) key_len: usize,
    pub(super) value: V,
    pub(super) value_len: usize,
}

impl<K, V> QueueEntry<K, V> {
    pub(super) fn new(queue_id: u64, key: K, key_len: usize, value: V, value_len: usize) -> Self {
        Self {
            queue_id,
            key,
            key_len,
            value,
            value_len,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Key length recorded at enqueue
    pub fn key_len(&self) -> usize {
        self.key_len
    }

    /// Value length recorded at enqueue
    pub fn value_len(&self) -> usize {
        self.value_len
    }

    pub(super) fn into_payloads(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> fmt::Debug for QueueEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("queue_id", &self.queue_id)
            .field("key_len", &self.key_len)
            .field("value_len", &self.value_len)
            .finish_non_exhaustive()
    }
}
