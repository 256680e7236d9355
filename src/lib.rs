//! lodedb - an embedded document store
//!
//! Writes are submitted by any number of threads through a bounded,
//! lock-free queue and committed in batches by a single storage writer.
//! Queries evaluate MongoDB-style equality filters with cross-type
//! numeric comparison.

pub mod api;
pub mod cli;
pub mod compare;
pub mod database;
pub mod executor;
pub mod observability;
pub mod queue;
pub mod storage;
pub mod value;
