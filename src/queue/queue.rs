//! Write submission queue
//!
//! Multi-producer, single-consumer. Producers hold cloneable `WriteQueue`
//! handles; the one `QueueConsumer` is handed out at creation and cannot
//! be duplicated, so a second consumer is unrepresentable.
//!
//! # Admission
//!
//! `enqueue` reserves a slot with one CAS on the packed state word and
//! then pushes into a lock-free ring. It never waits for capacity or for
//! the consumer. The signal mutex is touched only when the consumer is
//! parked and needs a wake-up.
//!
//! # Blocking
//!
//! `wait_nonempty` and `drain` park on condition variables. Every state
//! change they wait for is followed by a notify taken under the signal
//! mutex, and both re-check the state word under that mutex before
//! waiting.
//!
//! Storage commits happen in the consumer between `dequeue` and
//! `release`, never while any queue lock is held.

use std::fmt;
use std::mem;
use std::sync::atomic::{self, AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam_queue::ArrayQueue;

use super::entry::QueueEntry;
use super::errors::{EnqueueError, QueueError, QueueResult};
use super::hooks::QueueHooks;
use super::state::{QueuePhase, StateWord, FLUSHED, IN_FLIGHT_ONE, MAX_CAPACITY, PENDING_ONE};
use crate::observability::{log_event_with_fields, Event};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

struct Shared<K, V> {
    id: u64,
    capacity: usize,
    state: AtomicU64,
    ring: ArrayQueue<QueueEntry<K, V>>,
    hooks: QueueHooks<K, V>,
    consumer_parked: AtomicBool,
    destroyed: AtomicBool,
    signal: Mutex<()>,
    available: Condvar,
    drained: Condvar,
}

impl<K, V> Shared<K, V> {
    fn word(&self) -> StateWord {
        StateWord(self.state.load(Ordering::SeqCst))
    }

    fn lock_signal(&self) -> MutexGuard<'_, ()> {
        self.signal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake_consumer(&self) {
        let _guard = self.lock_signal();
        self.available.notify_one();
    }

    fn phase(&self) -> QueuePhase {
        if self.destroyed.load(Ordering::SeqCst) {
            return QueuePhase::Destroyed;
        }
        let word = self.word();
        match (word.is_flushed(), word.in_flight()) {
            (false, _) => QueuePhase::Open,
            (true, 0) => QueuePhase::Drained,
            (true, _) => QueuePhase::Flushing,
        }
    }

    fn flush(&self) {
        let previous = StateWord(self.state.fetch_or(FLUSHED, Ordering::SeqCst));
        if !previous.is_flushed() {
            log_event_with_fields(
                Event::QueueFlushed,
                &[
                    ("depth", previous.in_flight().to_string().as_str()),
                    ("queue_id", self.id.to_string().as_str()),
                ],
            );
        }
        let _guard = self.lock_signal();
        self.available.notify_all();
        self.drained.notify_all();
    }
}

/// Producer handle. Clone freely; every clone feeds the same consumer.
pub struct WriteQueue<K, V> {
    shared: Arc<Shared<K, V>>,
}

/// The single consumer handle.
///
/// All methods that remove or release entries take `&mut self`, so only
/// the thread that currently owns this handle can call them.
pub struct QueueConsumer<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> WriteQueue<K, V>
where
    K: AsRef<[u8]> + Send + 'static,
    V: AsRef<[u8]> + Send + 'static,
{
    /// Creates a queue holding at most `capacity` entries in flight.
    ///
    /// Returns the producer handle and the only consumer handle.
    ///
    /// # Errors
    ///
    /// `LODE_QUEUE_INVALID_CAPACITY` if `capacity` is zero or larger than
    /// `MAX_CAPACITY`; `LODE_QUEUE_ALLOC_FAILED` if the ring size cannot
    /// be represented.
    pub fn create(
        capacity: usize,
        hooks: QueueHooks<K, V>,
    ) -> QueueResult<(WriteQueue<K, V>, QueueConsumer<K, V>)> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(QueueError::invalid_capacity(capacity));
        }

        // Each ring slot carries the entry plus a stamp word.
        let slot_size = mem::size_of::<QueueEntry<K, V>>() + mem::size_of::<usize>();
        let fits = capacity
            .checked_mul(slot_size)
            .map_or(false, |bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(QueueError::allocation_failed(capacity));
        }

        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(Shared {
            id,
            capacity,
            state: AtomicU64::new(0),
            ring: ArrayQueue::new(capacity),
            hooks,
            consumer_parked: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            signal: Mutex::new(()),
            available: Condvar::new(),
            drained: Condvar::new(),
        });

        log_event_with_fields(
            Event::QueueCreated,
            &[
                ("capacity", capacity.to_string().as_str()),
                ("queue_id", id.to_string().as_str()),
            ],
        );

        let producer = WriteQueue {
            shared: Arc::clone(&shared),
        };
        Ok((producer, QueueConsumer { shared }))
    }

    /// Submits one key/value pair without copying either payload.
    ///
    /// Never waits. On `Full` the `on_full` hook has run exactly once on
    /// this thread; on `Flushed` it has not. Either way both payloads come
    /// back inside the error.
    pub fn enqueue(&self, key: K, value: V) -> Result<(), EnqueueError<K, V>> {
        let shared = &*self.shared;

        let mut current = shared.state.load(Ordering::SeqCst);
        loop {
            let word = StateWord(current);
            if word.is_flushed() {
                return Err(EnqueueError::Flushed { key, value });
            }
            if word.in_flight() >= shared.capacity {
                shared.hooks.on_full.on_full();
                return Err(EnqueueError::Full { key, value });
            }
            match shared.state.compare_exchange_weak(
                current,
                current + IN_FLIGHT_ONE + PENDING_ONE,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let key_len = key.as_ref().len();
        let value_len = value.as_ref().len();
        let entry = QueueEntry::new(shared.id, key, key_len, value, value_len);

        if let Err(entry) = shared.ring.push(entry) {
            // The reservation bounds the ring, so this only fires if that
            // accounting is broken. Give the slot back and report full.
            shared
                .state
                .fetch_sub(IN_FLIGHT_ONE + PENDING_ONE, Ordering::SeqCst);
            let (key, value) = entry.into_payloads();
            shared.hooks.on_full.on_full();
            return Err(EnqueueError::Full { key, value });
        }

        atomic::fence(Ordering::SeqCst);
        if shared.consumer_parked.load(Ordering::SeqCst) {
            shared.wake_consumer();
        }
        Ok(())
    }
}

impl<K, V> WriteQueue<K, V> {
    /// Stops admission. Idempotent and irreversible; wakes all waiters.
    pub fn flush(&self) {
        self.shared.flush();
    }

    /// Blocks until every enqueued entry has been released.
    ///
    /// Only the consumer's `release` lowers the depth, so this must not be
    /// called from the thread that owns the consumer.
    pub fn drain(&self) {
        let shared = &*self.shared;
        let mut guard = shared.lock_signal();
        while shared.word().in_flight() != 0 {
            guard = shared
                .drained
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Entries enqueued and not yet released
    pub fn depth(&self) -> usize {
        self.shared.word().in_flight()
    }

    /// Entries enqueued and not yet dequeued
    pub fn pending(&self) -> usize {
        self.shared.word().pending()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn is_flushed(&self) -> bool {
        self.shared.word().is_flushed()
    }

    pub fn phase(&self) -> QueuePhase {
        self.shared.phase()
    }
}

impl<K, V> Clone for WriteQueue<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, V> fmt::Debug for WriteQueue<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteQueue")
            .field("id", &self.shared.id)
            .field("capacity", &self.shared.capacity)
            .field("state", &self.shared.word())
            .finish()
    }
}

impl<K, V> QueueConsumer<K, V> {
    /// Removes one entry, or returns `None` if nothing is ready.
    pub fn dequeue(&mut self) -> Option<QueueEntry<K, V>> {
        let entry = self.shared.ring.pop()?;
        self.shared.state.fetch_sub(PENDING_ONE, Ordering::SeqCst);
        Some(entry)
    }

    /// Moves up to `max` ready entries into `out`; returns how many.
    pub fn dequeue_batch(&mut self, out: &mut Vec<QueueEntry<K, V>>, max: usize) -> usize {
        let mut taken = 0;
        while taken < max {
            match self.dequeue() {
                Some(entry) => {
                    out.push(entry);
                    taken += 1;
                }
                None => break,
            }
        }
        taken
    }

    /// Hands a dequeued entry back.
    ///
    /// Runs the key and value deallocators with the lengths recorded at
    /// enqueue, then lowers the depth.
    pub fn release(&mut self, entry: QueueEntry<K, V>) {
        let shared = &*self.shared;
        debug_assert_eq!(
            entry.queue_id, shared.id,
            "entry released into a queue that did not issue it"
        );

        let QueueEntry {
            key,
            key_len,
            value,
            value_len,
            ..
        } = entry;
        shared.hooks.free_key.free(key, key_len);
        shared.hooks.free_value.free(value, value_len);

        let previous = StateWord(shared.state.fetch_sub(IN_FLIGHT_ONE, Ordering::SeqCst));
        debug_assert!(previous.in_flight() > 0, "release without matching enqueue");
        if previous.in_flight() == 1 {
            let _guard = shared.lock_signal();
            shared.drained.notify_all();
        }
    }

    /// Fires the `on_batch_flush` hook for `entries` committed entries.
    pub fn signal_batch_flush(&mut self, entries: usize) {
        self.shared.hooks.on_batch_flush.on_batch_flush(entries);
    }

    /// Blocks until an entry can be dequeued.
    ///
    /// Returns `false` once the queue is flushed and nothing remains to
    /// dequeue; the consumer may then run its shutdown path.
    pub fn wait_nonempty(&mut self) -> bool {
        let shared = &*self.shared;
        loop {
            if !shared.ring.is_empty() {
                return true;
            }
            if shared.word().is_exhausted() {
                return false;
            }

            let guard = shared.lock_signal();
            shared.consumer_parked.store(true, Ordering::SeqCst);
            atomic::fence(Ordering::SeqCst);

            if !shared.ring.is_empty() || shared.word().is_exhausted() {
                shared.consumer_parked.store(false, Ordering::SeqCst);
                continue;
            }

            let guard = shared
                .available
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
            shared.consumer_parked.store(false, Ordering::SeqCst);
            drop(guard);
        }
    }

    /// Same as `WriteQueue::flush`, for consumers that need to stop
    /// admission themselves.
    pub fn flush(&self) {
        self.shared.flush();
    }

    pub fn depth(&self) -> usize {
        self.shared.word().in_flight()
    }

    pub fn pending(&self) -> usize {
        self.shared.word().pending()
    }

    pub fn is_flushed(&self) -> bool {
        self.shared.word().is_flushed()
    }

    pub fn phase(&self) -> QueuePhase {
        self.shared.phase()
    }

    /// Returns a producer handle for this queue.
    pub fn producer(&self) -> WriteQueue<K, V> {
        WriteQueue {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Tears the queue down.
    ///
    /// Succeeds only in the drained phase (flushed, depth 0). Otherwise the
    /// consumer comes back unchanged so the caller can finish draining.
    pub fn destroy(self) -> Result<(), Self> {
        let word = self.shared.word();
        if !word.is_flushed() || word.in_flight() != 0 {
            return Err(self);
        }
        self.shared.destroyed.store(true, Ordering::SeqCst);
        log_event_with_fields(
            Event::QueueDestroyed,
            &[("queue_id", self.shared.id.to_string().as_str())],
        );
        Ok(())
    }
}

impl<K, V> fmt::Debug for QueueConsumer<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConsumer")
            .field("id", &self.shared.id)
            .field("state", &self.shared.word())
            .finish()
    }
}
