//! Collections
//!
//! Writes are blind: they are encoded, keyed and submitted to the write
//! queue, and return once admitted. They become visible to `find` after
//! the storage writer commits them; `Database::sync` waits for that.

use std::sync::Arc;
use std::thread;

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};

use super::errors::{DatabaseError, DatabaseResult};
use super::key::document_key;
use super::Shared;
use crate::executor::{ExecutionResult, QueryExecutor};
use crate::queue::EnqueueError;
use crate::value::to_raw_document;

/// Handle to one named collection. Cheap to clone.
#[derive(Clone)]
pub struct Collection {
    name: String,
    prefix: Vec<u8>,
    shared: Arc<Shared>,
}

impl Collection {
    pub(super) fn new(name: String, prefix: Vec<u8>, shared: Arc<Shared>) -> Self {
        Self {
            name,
            prefix,
            shared,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submits `document`, assigning an ObjectId `_id` first if it has
    /// none. Returns the `_id`. An existing document with the same `_id`
    /// is replaced.
    pub fn insert_one(&self, document: Document) -> DatabaseResult<Bson> {
        let document = match document.get("_id") {
            Some(_) => document,
            None => {
                let mut with_id = doc! { "_id": ObjectId::new() };
                with_id.extend(document);
                with_id
            }
        };
        let id = document.get("_id").cloned().ok_or(DatabaseError::MissingId)?;
        self.put(&id, &document)?;
        Ok(id)
    }

    /// Stores `document` under its `_id`, inserting or replacing.
    pub fn replace_one(&self, document: Document) -> DatabaseResult<()> {
        let id = document.get("_id").ok_or(DatabaseError::MissingId)?;
        self.put(id, &document)
    }

    /// Removes the document with `_id` equal to `id`, if any.
    pub fn delete_one(&self, id: &Bson) -> DatabaseResult<()> {
        let key = document_key(&self.prefix, id)?;
        self.submit(key, Vec::new())
    }

    /// Returns committed documents matching `filter`, in key order.
    pub fn find(&self, filter: &Document, limit: Option<usize>) -> DatabaseResult<ExecutionResult> {
        let filter = to_raw_document(filter)?;
        let result =
            QueryExecutor::new(&*self.shared.store).execute(&self.prefix, &filter, limit)?;
        self.shared
            .metrics
            .record_query(result.scanned_count as u64, result.returned_count as u64);
        Ok(result)
    }

    /// Counts committed documents matching `filter`.
    pub fn count(&self, filter: &Document) -> DatabaseResult<usize> {
        let filter = to_raw_document(filter)?;
        let result = QueryExecutor::new(&*self.shared.store).count(&self.prefix, &filter)?;
        self.shared
            .metrics
            .record_query(result.scanned_count as u64, result.returned_count as u64);
        Ok(result.returned_count)
    }

    fn put(&self, id: &Bson, document: &Document) -> DatabaseResult<()> {
        let key = document_key(&self.prefix, id)?;
        let value = to_raw_document(document)?.into_bytes();
        self.submit(key, value)
    }

    /// Enqueues with bounded retry. A full queue is retried after a yield
    /// up to `enqueue_retries` times; a flushed queue means the database
    /// is closed.
    fn submit(&self, key: Vec<u8>, value: Vec<u8>) -> DatabaseResult<()> {
        let shared = &*self.shared;
        let mut payload = (key, value);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match shared.queue.enqueue(payload.0, payload.1) {
                Ok(()) => {
                    shared.metrics.increment_writes_enqueued();
                    return Ok(());
                }
                Err(EnqueueError::Flushed { .. }) => {
                    shared.metrics.increment_rejected_flushed();
                    return Err(DatabaseError::Closed);
                }
                Err(err @ EnqueueError::Full { .. }) => {
                    if attempts > shared.config.enqueue_retries {
                        return Err(DatabaseError::Backpressure { attempts });
                    }
                    payload = err.into_payloads();
                    thread::yield_now();
                }
            }
        }
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}
