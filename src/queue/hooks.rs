//! Queue hooks
//!
//! Capabilities bound to a queue at creation. Any closure with the right
//! signature implements the matching trait, so callers capture whatever
//! context they need instead of threading opaque arguments through.

use std::fmt;

/// Takes ownership of a released payload.
///
/// Receives the payload together with the length recorded at enqueue.
pub trait Deallocator<T>: Send + Sync {
    fn free(&self, payload: T, len: usize);
}

/// Called synchronously by a producer whose enqueue found the queue full.
///
/// Runs on the producer's thread inside `enqueue`: it must not block,
/// allocate, or call back into the queue.
pub trait FullNotifier: Send + Sync {
    fn on_full(&self);
}

/// Called by the consumer when its batching policy commits a group of
/// dequeued entries. The queue itself never fires it.
pub trait BatchFlushNotifier: Send + Sync {
    fn on_batch_flush(&self, entries: usize);
}

impl<T, F> Deallocator<T> for F
where
    F: Fn(T, usize) + Send + Sync,
{
    fn free(&self, payload: T, len: usize) {
        self(payload, len)
    }
}

impl<F> FullNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn on_full(&self) {
        self()
    }
}

impl<F> BatchFlushNotifier for F
where
    F: Fn(usize) + Send + Sync,
{
    fn on_batch_flush(&self, entries: usize) {
        self(entries)
    }
}

/// The full hook set of one queue instance.
///
/// Defaults: payloads are dropped on release, notifications are ignored.
pub struct QueueHooks<K, V> {
    pub(super) free_key: Box<dyn Deallocator<K>>,
    pub(super) free_value: Box<dyn Deallocator<V>>,
    pub(super) on_full: Box<dyn FullNotifier>,
    pub(super) on_batch_flush: Box<dyn BatchFlushNotifier>,
}

impl<K: Send + 'static, V: Send + 'static> QueueHooks<K, V> {
    /// Hooks with default behavior
    pub fn new() -> Self {
        Self {
            free_key: Box::new(|payload: K, _len: usize| drop(payload)),
            free_value: Box::new(|payload: V, _len: usize| drop(payload)),
            on_full: Box::new(|| {}),
            on_batch_flush: Box::new(|_entries: usize| {}),
        }
    }

    /// Sets the key deallocator
    pub fn free_key(mut self, hook: impl Deallocator<K> + 'static) -> Self {
        self.free_key = Box::new(hook);
        self
    }

    /// Sets the value deallocator
    pub fn free_value(mut self, hook: impl Deallocator<V> + 'static) -> Self {
        self.free_value = Box::new(hook);
        self
    }

    /// Sets the full notifier
    pub fn on_full(mut self, hook: impl FullNotifier + 'static) -> Self {
        self.on_full = Box::new(hook);
        self
    }

    /// Sets the batch flush notifier
    pub fn on_batch_flush(mut self, hook: impl BatchFlushNotifier + 'static) -> Self {
        self.on_batch_flush = Box::new(hook);
        self
    }
}

impl<K: Send + 'static, V: Send + 'static> Default for QueueHooks<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for QueueHooks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueHooks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closures_implement_hooks() {
        let freed = Arc::new(AtomicUsize::new(0));
        let full = Arc::new(AtomicUsize::new(0));
        let flushed = Arc::new(AtomicUsize::new(0));

        let hooks: QueueHooks<Vec<u8>, Vec<u8>> = {
            let freed_k = Arc::clone(&freed);
            let freed_v = Arc::clone(&freed);
            let full = Arc::clone(&full);
            let flushed = Arc::clone(&flushed);
            QueueHooks::new()
                .free_key(move |_k: Vec<u8>, len: usize| {
                    freed_k.fetch_add(len, Ordering::Relaxed);
                })
                .free_value(move |_v: Vec<u8>, len: usize| {
                    freed_v.fetch_add(len, Ordering::Relaxed);
                })
                .on_full(move || {
                    full.fetch_add(1, Ordering::Relaxed);
                })
                .on_batch_flush(move |n: usize| {
                    flushed.fetch_add(n, Ordering::Relaxed);
                })
        };

        hooks.free_key.free(vec![1, 2, 3], 3);
        hooks.free_value.free(vec![4], 1);
        hooks.on_full.on_full();
        hooks.on_batch_flush.on_batch_flush(7);

        assert_eq!(freed.load(Ordering::Relaxed), 4);
        assert_eq!(full.load(Ordering::Relaxed), 1);
        assert_eq!(flushed.load(Ordering::Relaxed), 7);
    }
}
