//! Storage writer
//!
//! The single consumer of the write submission queue. It runs on its own
//! thread, turns ready entries into storage transactions and hands every
//! entry back to the queue once its commit attempt is over.
//!
//! Entry encoding: an empty value deletes the key; any other value is a
//! BSON document stored under the key.
//!
//! Failure handling per commit:
//! - retryable (writer busy): retried up to `commit_retries` times
//! - invalid document: the batch is retried one entry at a time so only
//!   the offending entries are rejected
//! - fatal: committing stops, the queue is flushed, remaining entries are
//!   released uncommitted, and `join` returns the error
//! - anything else: the batch is rejected and the writer moves on

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::Serialize;

use super::batching::BatchPolicy;
use super::engine::StorageEngine;
use super::errors::{StorageError, StorageErrorCode, StorageResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::queue::{QueueConsumer, QueueEntry};

/// Counters for one writer run, returned by `WriterHandle::join`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    /// Commits that applied at least one entry
    pub batches: u64,
    pub entries_committed: u64,
    /// Entries released without being applied
    pub entries_rejected: u64,
    pub commit_retries: u64,
}

/// Writer settings
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    pub policy: BatchPolicy,
    pub commit_retries: u32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            policy: BatchPolicy::default(),
            commit_retries: 3,
        }
    }
}

pub struct StorageWriter<E, K, V> {
    engine: Arc<E>,
    consumer: QueueConsumer<K, V>,
    options: WriterOptions,
    metrics: Arc<MetricsRegistry>,
    stats: WriterStats,
}

/// Handle to a running writer thread.
#[derive(Debug)]
pub struct WriterHandle {
    thread: JoinHandle<StorageResult<WriterStats>>,
}

impl WriterHandle {
    /// Waits for the writer to exit.
    ///
    /// The writer exits after the queue has been flushed and every entry
    /// released. Returns the fatal error that stopped it, if any.
    pub fn join(self) -> StorageResult<WriterStats> {
        self.thread
            .join()
            .map_err(|_| StorageError::write_failed("storage writer thread panicked"))?
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

enum Attempt {
    Committed,
    Failed(StorageError),
}

/// A fatal error part way through a batch.
struct BatchFailure {
    /// Entries applied before the error
    committed: usize,
    /// Entries already counted as committed or rejected
    settled: usize,
    error: StorageError,
}

impl<E, K, V> StorageWriter<E, K, V>
where
    E: StorageEngine + 'static,
    K: AsRef<[u8]> + Send + 'static,
    V: AsRef<[u8]> + Send + 'static,
{
    pub fn new(
        engine: Arc<E>,
        consumer: QueueConsumer<K, V>,
        options: WriterOptions,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            engine,
            consumer,
            options,
            metrics,
            stats: WriterStats::default(),
        }
    }

    /// Starts the writer on a dedicated thread.
    pub fn spawn(self) -> std::io::Result<WriterHandle> {
        let thread = thread::Builder::new()
            .name("lodedb-writer".to_string())
            .spawn(move || self.run())?;
        Ok(WriterHandle { thread })
    }

    /// Runs the writer loop on the current thread until the queue is
    /// flushed and drained.
    pub fn run(mut self) -> StorageResult<WriterStats> {
        log_event_with_fields(
            Event::WriterStart,
            &[
                ("max_bytes", self.options.policy.max_bytes().to_string().as_str()),
                ("max_records", self.options.policy.max_records().to_string().as_str()),
            ],
        );

        let mut batch = Vec::with_capacity(self.options.policy.max_records());
        let mut failure: Option<StorageError> = None;

        while self.consumer.wait_nonempty() {
            if self.options.policy.fill(&mut self.consumer, &mut batch) == 0 {
                continue;
            }

            let committed = if failure.is_some() {
                self.reject(batch.len());
                0
            } else {
                match self.commit_batch(&batch) {
                    Ok(committed) => committed,
                    Err(BatchFailure {
                        committed,
                        settled,
                        error,
                    }) => {
                        log_event_with_fields(
                            Event::CommitFailed,
                            &[
                                ("code", error.code().code()),
                                ("committed", committed.to_string().as_str()),
                                ("error", error.to_string().as_str()),
                            ],
                        );
                        self.metrics.increment_commit_failures();
                        self.reject(batch.len() - settled);
                        self.consumer.flush();
                        failure = Some(error);
                        committed
                    }
                }
            };

            if committed > 0 {
                self.stats.batches += 1;
                self.stats.entries_committed += committed as u64;
                self.consumer.signal_batch_flush(committed);
                log_event_with_fields(
                    Event::BatchCommitted,
                    &[("entries", committed.to_string().as_str())],
                );
            }

            for entry in batch.drain(..) {
                self.consumer.release(entry);
            }
        }

        if self.consumer.destroy().is_err() {
            // wait_nonempty only returns false once flushed with nothing
            // pending, and every dequeued entry has been released above.
            debug_assert!(false, "queue not drained at writer exit");
        }

        log_event_with_fields(
            Event::WriterStop,
            &[
                ("batches", self.stats.batches.to_string().as_str()),
                ("committed", self.stats.entries_committed.to_string().as_str()),
                ("rejected", self.stats.entries_rejected.to_string().as_str()),
            ],
        );

        match failure {
            Some(err) => Err(err),
            None => Ok(self.stats),
        }
    }

    /// Commits a batch; returns how many entries were applied.
    fn commit_batch(&mut self, batch: &[QueueEntry<K, V>]) -> Result<usize, BatchFailure> {
        match self.commit_with_retry(batch) {
            Attempt::Committed => Ok(batch.len()),
            Attempt::Failed(err) if err.code() == StorageErrorCode::LodeStorageInvalidDocument => {
                if batch.len() == 1 {
                    self.reject_invalid(&err);
                    return Ok(0);
                }
                self.commit_individually(batch)
            }
            Attempt::Failed(err) if err.is_fatal() => Err(BatchFailure {
                committed: 0,
                settled: 0,
                error: err,
            }),
            Attempt::Failed(err) => {
                log_event_with_fields(
                    Event::CommitFailed,
                    &[
                        ("code", err.code().code()),
                        ("entries", batch.len().to_string().as_str()),
                        ("error", err.message()),
                    ],
                );
                self.metrics.increment_commit_failures();
                self.reject(batch.len());
                Ok(0)
            }
        }
    }

    fn commit_individually(
        &mut self,
        batch: &[QueueEntry<K, V>],
    ) -> Result<usize, BatchFailure> {
        let mut committed = 0;
        for (settled, entry) in batch.iter().enumerate() {
            match self.commit_with_retry(std::slice::from_ref(entry)) {
                Attempt::Committed => committed += 1,
                Attempt::Failed(err) if err.is_fatal() => {
                    return Err(BatchFailure {
                        committed,
                        settled,
                        error: err,
                    })
                }
                Attempt::Failed(err) => {
                    if err.code() == StorageErrorCode::LodeStorageInvalidDocument {
                        self.reject_invalid(&err);
                    } else {
                        self.metrics.increment_commit_failures();
                        self.reject(1);
                    }
                }
            }
        }
        Ok(committed)
    }

    fn commit_with_retry(&mut self, entries: &[QueueEntry<K, V>]) -> Attempt {
        let mut attempt = 0u32;
        loop {
            match self.try_commit(entries) {
                Ok(()) => return Attempt::Committed,
                Err(err) if err.is_retryable() && attempt < self.options.commit_retries => {
                    attempt += 1;
                    self.stats.commit_retries += 1;
                    self.metrics.increment_commit_retries();
                    log_event_with_fields(
                        Event::CommitRetry,
                        &[("attempt", attempt.to_string().as_str()), ("code", err.code().code())],
                    );
                    thread::yield_now();
                }
                Err(err) => return Attempt::Failed(err),
            }
        }
    }

    fn try_commit(&self, entries: &[QueueEntry<K, V>]) -> StorageResult<()> {
        let mut txn = self.engine.begin_write()?;
        for entry in entries {
            let key = entry.key().as_ref();
            let value = entry.value().as_ref();
            if value.is_empty() {
                txn.delete(key)?;
            } else {
                txn.put(key, value)?;
            }
        }
        txn.commit()
    }

    fn reject(&mut self, entries: usize) {
        self.stats.entries_rejected += entries as u64;
        self.metrics.add_entries_rejected(entries as u64);
    }

    fn reject_invalid(&mut self, err: &StorageError) {
        log_event_with_fields(
            Event::WriteRejected,
            &[("code", err.code().code()), ("error", err.to_string().as_str())],
        );
        self.reject(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{QueueHooks, WriteQueue};
    use crate::storage::engine::{MemoryStore, ScanVisitor, WriteTransaction};
    use bson::rawdoc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    type Bytes = Vec<u8>;

    /// Wraps a `MemoryStore`, failing `begin_write` on demand.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        busy_failures: AtomicUsize,
        fatal: AtomicBool,
        /// When non-zero, `begin_write` turns fatal once this many calls
        /// have succeeded.
        fatal_after: AtomicUsize,
        begins: AtomicUsize,
    }

    impl StorageEngine for FlakyStore {
        fn begin_write(&self) -> StorageResult<Box<dyn WriteTransaction + '_>> {
            if self.fatal.load(Ordering::SeqCst) {
                return Err(StorageError::data_corruption(b"", "injected"));
            }
            let remaining = self.busy_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.busy_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(StorageError::writer_busy());
            }
            let limit = self.fatal_after.load(Ordering::SeqCst);
            if limit > 0 && self.begins.fetch_add(1, Ordering::SeqCst) >= limit {
                return Err(StorageError::data_corruption(b"", "injected"));
            }
            self.inner.begin_write()
        }

        fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn scan_prefix(&self, prefix: &[u8], visitor: &mut ScanVisitor<'_>) -> StorageResult<()> {
            self.inner.scan_prefix(prefix, visitor)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    fn doc(n: i32) -> Bytes {
        rawdoc! { "n": n }.into_bytes()
    }

    fn options(max_records: usize, commit_retries: u32) -> WriterOptions {
        WriterOptions {
            policy: BatchPolicy::new(max_records, usize::MAX),
            commit_retries,
        }
    }

    fn start(
        store: Arc<FlakyStore>,
        hooks: QueueHooks<Bytes, Bytes>,
        opts: WriterOptions,
    ) -> (WriteQueue<Bytes, Bytes>, WriterHandle) {
        let (queue, consumer) = WriteQueue::create(256, hooks).unwrap();
        let writer = StorageWriter::new(store, consumer, opts, Arc::new(MetricsRegistry::new()));
        (queue, writer.spawn().unwrap())
    }

    #[test]
    fn test_entries_reach_storage_and_are_released() {
        let released = Arc::new(AtomicUsize::new(0));
        let flushed = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let released = Arc::clone(&released);
            let flushed = Arc::clone(&flushed);
            QueueHooks::new()
                .free_value(move |_v: Bytes, _len: usize| {
                    released.fetch_add(1, Ordering::SeqCst);
                })
                .on_batch_flush(move |n: usize| {
                    flushed.fetch_add(n, Ordering::SeqCst);
                })
        };
        let store = Arc::new(FlakyStore::default());
        let (queue, handle) = start(Arc::clone(&store), hooks, options(8, 3));

        for i in 0..100 {
            queue.enqueue(format!("k{:03}", i).into_bytes(), doc(i)).unwrap();
        }
        queue.flush();
        let stats = handle.join().unwrap();

        assert_eq!(stats.entries_committed, 100);
        assert_eq!(stats.entries_rejected, 0);
        assert_eq!(store.len(), 100);
        assert_eq!(store.get(b"k042").unwrap(), Some(doc(42)));
        assert_eq!(released.load(Ordering::SeqCst), 100);
        assert_eq!(flushed.load(Ordering::SeqCst), 100);
        assert_eq!(queue.depth(), 0);
    }

    #[test]
    fn test_empty_value_deletes() {
        let store = Arc::new(FlakyStore::default());
        let (queue, handle) = start(Arc::clone(&store), QueueHooks::new(), options(1, 0));

        queue.enqueue(b"a".to_vec(), doc(1)).unwrap();
        queue.enqueue(b"b".to_vec(), doc(2)).unwrap();
        queue.enqueue(b"a".to_vec(), Vec::new()).unwrap();
        queue.flush();
        handle.join().unwrap();

        assert_eq!(store.get(b"a").unwrap(), None);
        assert_eq!(store.get(b"b").unwrap(), Some(doc(2)));
    }

    #[test]
    fn test_invalid_entry_rejected_alone() {
        let store = Arc::new(FlakyStore::default());
        let (queue, consumer) = WriteQueue::create(16, QueueHooks::new()).unwrap();
        queue.enqueue(b"a".to_vec(), doc(1)).unwrap();
        queue.enqueue(b"bad".to_vec(), vec![1, 2, 3]).unwrap();
        queue.enqueue(b"c".to_vec(), doc(3)).unwrap();
        queue.flush();

        // Run inline so all three land in one batch.
        let writer = StorageWriter::new(
            Arc::clone(&store),
            consumer,
            options(16, 0),
            Arc::new(MetricsRegistry::new()),
        );
        let stats = writer.run().unwrap();

        assert_eq!(stats.entries_committed, 2);
        assert_eq!(stats.entries_rejected, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(b"bad").unwrap(), None);
    }

    #[test]
    fn test_busy_commit_is_retried() {
        let store = Arc::new(FlakyStore::default());
        store.busy_failures.store(2, Ordering::SeqCst);
        let (queue, consumer) = WriteQueue::create(4, QueueHooks::new()).unwrap();
        queue.enqueue(b"a".to_vec(), doc(1)).unwrap();
        queue.flush();

        let metrics = Arc::new(MetricsRegistry::new());
        let writer = StorageWriter::new(Arc::clone(&store), consumer, options(4, 3), Arc::clone(&metrics));
        let stats = writer.run().unwrap();

        assert_eq!(stats.commit_retries, 2);
        assert_eq!(stats.entries_committed, 1);
        assert_eq!(metrics.snapshot().commit_retries, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_retries_exhausted_rejects_batch() {
        let store = Arc::new(FlakyStore::default());
        store.busy_failures.store(10, Ordering::SeqCst);
        let (queue, consumer) = WriteQueue::create(4, QueueHooks::new()).unwrap();
        queue.enqueue(b"a".to_vec(), doc(1)).unwrap();
        queue.flush();

        let writer = StorageWriter::new(
            Arc::clone(&store),
            consumer,
            options(4, 2),
            Arc::new(MetricsRegistry::new()),
        );
        let stats = writer.run().unwrap();

        assert_eq!(stats.commit_retries, 2);
        assert_eq!(stats.entries_rejected, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_fatal_error_flushes_and_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let released = Arc::clone(&released);
            QueueHooks::new().free_key(move |_k: Bytes, _len: usize| {
                released.fetch_add(1, Ordering::SeqCst);
            })
        };
        let store = Arc::new(FlakyStore::default());
        store.fatal.store(true, Ordering::SeqCst);
        let (queue, consumer) = WriteQueue::create(16, hooks).unwrap();
        for i in 0..5 {
            queue.enqueue(vec![i], doc(i as i32)).unwrap();
        }

        let writer = StorageWriter::new(
            Arc::clone(&store),
            consumer,
            options(2, 3),
            Arc::new(MetricsRegistry::new()),
        );
        // No external flush: the writer flushes the queue itself.
        let err = writer.run().unwrap_err();

        assert!(err.is_fatal());
        assert!(queue.is_flushed());
        assert_eq!(queue.depth(), 0);
        assert_eq!(released.load(Ordering::SeqCst), 5);
        assert!(queue.enqueue(vec![9], doc(9)).unwrap_err().is_flushed());
    }

    #[test]
    fn test_zero_bound_policy_drains() {
        let store = Arc::new(FlakyStore::default());
        let opts = WriterOptions {
            policy: BatchPolicy::new(0, 0),
            commit_retries: 0,
        };
        let (queue, handle) = start(Arc::clone(&store), QueueHooks::new(), opts);

        for i in 0..3 {
            queue.enqueue(vec![i], doc(i as i32)).unwrap();
        }
        queue.flush();
        let stats = handle.join().unwrap();

        assert_eq!(stats.entries_committed, 3);
        assert_eq!(stats.batches, 3);
        assert_eq!(queue.depth(), 0);
    }

    #[test]
    fn test_fatal_during_fallback_keeps_committed_count() {
        let flushed = Arc::new(AtomicUsize::new(0));
        let hooks = {
            let flushed = Arc::clone(&flushed);
            QueueHooks::new().on_batch_flush(move |n: usize| {
                flushed.fetch_add(n, Ordering::SeqCst);
            })
        };
        let store = Arc::new(FlakyStore::default());
        // Batch attempt, then "a", then "bad"; the commit of "c" is fatal.
        store.fatal_after.store(3, Ordering::SeqCst);
        let (queue, consumer) = WriteQueue::create(16, hooks).unwrap();
        queue.enqueue(b"a".to_vec(), doc(1)).unwrap();
        queue.enqueue(b"bad".to_vec(), vec![1, 2, 3]).unwrap();
        queue.enqueue(b"c".to_vec(), doc(3)).unwrap();
        queue.enqueue(b"d".to_vec(), doc(4)).unwrap();
        queue.flush();

        let metrics = Arc::new(MetricsRegistry::new());
        let writer = StorageWriter::new(
            Arc::clone(&store),
            consumer,
            options(16, 0),
            Arc::clone(&metrics),
        );
        let err = writer.run().unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b"a").unwrap(), Some(doc(1)));
        assert_eq!(flushed.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.snapshot().entries_rejected, 3);
        assert_eq!(queue.depth(), 0);
    }
}
