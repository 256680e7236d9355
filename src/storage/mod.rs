//! Document storage subsystem for lodedb
//!
//! An ordered key/document store written by exactly one thread, the
//! storage writer, which drains the write submission queue in batches.
//!
//! # Design Principles
//!
//! - Single writer, enforced by the engine
//! - Atomic commits: staged operations become visible together
//! - Checksum-verified on every read
//! - Halt on corruption

mod batching;
mod checksum;
mod engine;
mod errors;
mod record;
mod writer;

pub use batching::BatchPolicy;
pub use checksum::{compute_checksum, verify_checksum};
pub use engine::{MemoryStore, ScanVisitor, StorageEngine, WriteTransaction};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use record::{validate_document, StoredRecord};
pub use writer::{StorageWriter, WriterHandle, WriterOptions, WriterStats};
