//! Query executor subsystem for lodedb
//!
//! Scans a collection's key range, verifies every record on read and
//! keeps the documents a filter document matches.
//!
//! # Invariants
//!
//! - Deterministic execution: results come back in key order
//! - Checksum validation on every read
//! - Fail loudly on corruption

mod errors;
#[allow(clippy::module_inception)]
mod executor;
mod filters;
mod result;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use executor::QueryExecutor;
pub use filters::PredicateFilter;
pub use result::{ExecutionResult, ResultDocument};
