//! Query executor
//!
//! Execution flow (strict order):
//! 1. Scan the collection's key range in key order
//! 2. Verify each record's checksum (done by the engine)
//! 3. Filter with `PredicateFilter`
//! 4. Apply limit
//!
//! Scans read committed state only. Writes still in the submission queue
//! are not visible until the storage writer commits them.

use bson::RawDocument;

use super::errors::ExecutorResult;
use super::filters::PredicateFilter;
use super::result::{ExecutionResult, ResultDocument};
use crate::storage::StorageEngine;

/// Executes filter queries against a storage engine.
pub struct QueryExecutor<'a, E: StorageEngine + ?Sized> {
    engine: &'a E,
}

impl<'a, E: StorageEngine + ?Sized> QueryExecutor<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Returns documents under `prefix` matching `filter`, at most `limit`.
    ///
    /// Deterministic: same data and same filter give the same results in
    /// the same order.
    pub fn execute(
        &self,
        prefix: &[u8],
        filter: &RawDocument,
        limit: Option<usize>,
    ) -> ExecutorResult<ExecutionResult> {
        let limit = limit.unwrap_or(usize::MAX);
        let mut result = ExecutionResult::default();

        if limit == 0 {
            return Ok(result);
        }

        self.engine.scan_prefix(prefix, &mut |key, doc| {
            result.scanned_count += 1;
            if !PredicateFilter::matches(doc, filter) {
                return true;
            }
            if result.documents.len() == limit {
                result.limit_applied = true;
                return false;
            }
            result
                .documents
                .push(ResultDocument::new(key, doc.to_raw_document_buf()));
            true
        })?;

        result.returned_count = result.documents.len();
        Ok(result)
    }

    /// Counts documents under `prefix` matching `filter`.
    ///
    /// The result carries no documents; `returned_count` is the count.
    pub fn count(&self, prefix: &[u8], filter: &RawDocument) -> ExecutorResult<ExecutionResult> {
        let mut result = ExecutionResult::default();
        self.engine.scan_prefix(prefix, &mut |_, doc| {
            result.scanned_count += 1;
            if PredicateFilter::matches(doc, filter) {
                result.returned_count += 1;
            }
            true
        })?;
        Ok(result)
    }
}
