//! Write submission queue for lodedb
//!
//! Producers on any thread hand key/value payloads to a single consumer
//! (the storage writer) without copying them and without waiting.
//!
//! # Guarantees
//!
//! - Depth (enqueued minus released) never exceeds capacity
//! - A rejected enqueue returns both payloads; `on_full` fires once per
//!   capacity rejection and never for a flushed rejection
//! - Every admitted entry is dequeued exactly once and released exactly
//!   once, with the payloads and lengths it was enqueued with
//! - `flush` is irreversible; `destroy` succeeds only once drained
//!
//! # Lifecycle
//!
//! Open → (flush) → Flushing → (last release) → Drained → (destroy) → Destroyed

mod entry;
mod errors;
mod hooks;
#[allow(clippy::module_inception)]
mod queue;
mod state;

pub use entry::QueueEntry;
pub use errors::{EnqueueError, QueueError, QueueErrorCode, QueueResult, Severity};
pub use hooks::{BatchFlushNotifier, Deallocator, FullNotifier, QueueHooks};
pub use queue::{QueueConsumer, WriteQueue};
pub use state::{QueuePhase, MAX_CAPACITY};
