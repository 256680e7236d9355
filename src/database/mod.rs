//! Database handle for lodedb
//!
//! Ties the pieces together: one in-memory store, one write submission
//! queue, one storage writer thread draining it, and collection handles
//! that submit writes and run queries.
//!
//! ```ignore
//! use bson::doc;
//! use lodedb::database::{Database, DatabaseConfig};
//!
//! let db = Database::open(DatabaseConfig::default())?;
//! let items = db.collection("items")?;
//! items.insert_one(doc! { "qty": 42_i64 })?;
//! db.sync();
//! assert_eq!(items.count(&doc! { "qty": 42.0 })?, 1);
//! db.close()?;
//! ```

mod collection;
mod config;
mod errors;
mod key;

pub use collection::Collection;
pub use config::DatabaseConfig;
pub use errors::{DatabaseError, DatabaseResult};
pub use key::{collection_prefix, document_key, validate_collection_name};

use std::sync::Arc;

use serde::Serialize;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot};
use crate::queue::{QueueHooks, QueuePhase, WriteQueue};
use crate::storage::{MemoryStore, StorageEngine, StorageWriter, WriterHandle, WriterStats};

type Payload = Vec<u8>;

/// State shared by the database and its collections.
pub(crate) struct Shared {
    config: DatabaseConfig,
    store: Arc<MemoryStore>,
    queue: WriteQueue<Payload, Payload>,
    metrics: Arc<MetricsRegistry>,
}

/// Point-in-time view of the database, as served by `stats`.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub documents: usize,
    pub queue_depth: usize,
    pub queue_capacity: usize,
    pub queue_phase: String,
    pub metrics: MetricsSnapshot,
}

/// An open database.
///
/// Dropping it without `close` still flushes the queue and waits for the
/// writer, discarding the writer's result.
pub struct Database {
    shared: Arc<Shared>,
    writer: Option<WriterHandle>,
}

impl Database {
    /// Validates `config`, creates the queue and starts the writer.
    pub fn open(config: DatabaseConfig) -> DatabaseResult<Self> {
        config.validate()?;

        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(MetricsRegistry::new());
        let hooks = Self::hooks(&metrics);

        let (queue, consumer) = WriteQueue::create(config.queue_capacity, hooks)?;
        let writer = StorageWriter::new(
            Arc::clone(&store),
            consumer,
            config.writer_options(),
            Arc::clone(&metrics),
        )
        .spawn()
        .map_err(|e| DatabaseError::WriterSpawn(e.to_string()))?;

        log_event_with_fields(
            Event::DatabaseOpen,
            &[
                ("batch_max_records", config.batch_max_records.to_string().as_str()),
                ("queue_capacity", config.queue_capacity.to_string().as_str()),
            ],
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                store,
                queue,
                metrics,
            }),
            writer: Some(writer),
        })
    }

    /// Queue hooks feeding the metrics registry. Payloads are dropped on
    /// release after their lengths are counted.
    fn hooks(metrics: &Arc<MetricsRegistry>) -> QueueHooks<Payload, Payload> {
        let on_full = Arc::clone(metrics);
        let on_batch = Arc::clone(metrics);
        let key_bytes = Arc::clone(metrics);
        let value_bytes = Arc::clone(metrics);
        QueueHooks::new()
            .on_full(move || on_full.increment_rejected_full())
            .on_batch_flush(move |entries: usize| on_batch.record_batch(entries as u64))
            .free_key(move |key: Payload, len: usize| {
                key_bytes.add_bytes_released(len as u64);
                drop(key);
            })
            .free_value(move |value: Payload, len: usize| {
                value_bytes.add_bytes_released(len as u64);
                drop(value);
            })
    }

    /// Returns a handle to the named collection.
    pub fn collection(&self, name: &str) -> DatabaseResult<Collection> {
        validate_collection_name(name)?;
        Ok(Collection::new(
            name.to_string(),
            collection_prefix(name),
            Arc::clone(&self.shared),
        ))
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.shared.config
    }

    /// Blocks until every write submitted so far has been committed (or
    /// rejected) and released.
    pub fn sync(&self) {
        self.shared.queue.drain();
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            documents: self.shared.store.len(),
            queue_depth: self.shared.queue.depth(),
            queue_capacity: self.shared.queue.capacity(),
            queue_phase: self.shared.queue.phase().to_string(),
            metrics: self.shared.metrics.snapshot(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.queue.phase() != QueuePhase::Open
    }

    /// Stops admission, lets the writer commit everything already
    /// admitted, and returns its counters.
    ///
    /// # Errors
    ///
    /// The fatal storage error that stopped the writer, if any.
    pub fn close(mut self) -> DatabaseResult<WriterStats> {
        let stats = self.shutdown()?;
        log_event_with_fields(
            Event::DatabaseClose,
            &[("committed", stats.entries_committed.to_string().as_str())],
        );
        Ok(stats)
    }

    fn shutdown(&mut self) -> DatabaseResult<WriterStats> {
        self.shared.queue.flush();
        match self.writer.take() {
            Some(writer) => Ok(writer.join()?),
            None => Ok(WriterStats::default()),
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.writer.is_some() {
            let _ = self.shutdown();
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.shared.config)
            .field("queue", &self.shared.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, Bson};

    fn small_db() -> Database {
        Database::open(DatabaseConfig {
            queue_capacity: 8,
            ..DatabaseConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_insert_sync_find() {
        let db = small_db();
        let items = db.collection("items").unwrap();
        let id = items.insert_one(doc! { "qty": 42 }).unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));

        db.sync();
        let found = items.find(&doc! { "qty": 42_i64 }, None).unwrap();
        assert_eq!(found.returned_count, 1);
        let stored = found.documents[0].to_document().unwrap();
        assert_eq!(stored.get("_id"), Some(&id));
        assert_eq!(stored.keys().next().map(String::as_str), Some("_id"));

        let stats = db.close().unwrap();
        assert_eq!(stats.entries_committed, 1);
    }

    #[test]
    fn test_replace_and_delete() {
        let db = small_db();
        let items = db.collection("items").unwrap();
        items.insert_one(doc! { "_id": 7, "v": 1 }).unwrap();
        items.replace_one(doc! { "_id": 7_i64, "v": 2 }).unwrap();
        db.sync();
        assert_eq!(items.count(&doc! {}).unwrap(), 1);
        assert_eq!(items.count(&doc! { "v": 2 }).unwrap(), 1);

        items.delete_one(&Bson::Int32(7)).unwrap();
        db.sync();
        assert_eq!(items.count(&doc! {}).unwrap(), 0);
    }

    #[test]
    fn test_replace_requires_id() {
        let db = small_db();
        let items = db.collection("items").unwrap();
        assert!(matches!(
            items.replace_one(doc! { "v": 1 }),
            Err(DatabaseError::MissingId)
        ));
    }

    #[test]
    fn test_collections_are_isolated() {
        let db = small_db();
        let a = db.collection("a").unwrap();
        let b = db.collection("b").unwrap();
        a.insert_one(doc! { "_id": 1, "v": 1 }).unwrap();
        b.insert_one(doc! { "_id": 1, "v": 2 }).unwrap();
        db.sync();
        assert_eq!(a.count(&doc! { "v": 1 }).unwrap(), 1);
        assert_eq!(a.count(&doc! { "v": 2 }).unwrap(), 0);
        assert_eq!(db.stats().documents, 2);
    }

    #[test]
    fn test_writes_after_close_are_refused() {
        let db = small_db();
        let items = db.collection("items").unwrap();
        db.close().unwrap();
        assert!(matches!(
            items.insert_one(doc! { "v": 1 }),
            Err(DatabaseError::Closed)
        ));
    }

    #[test]
    fn test_invalid_collection_name() {
        let db = small_db();
        assert!(db.collection("").is_err());
        assert!(db.collection("bad\0name").is_err());
    }

    #[test]
    fn test_metrics_wired_through_hooks() {
        let db = small_db();
        let items = db.collection("items").unwrap();
        for i in 0..5 {
            items.insert_one(doc! { "_id": i, "v": i }).unwrap();
        }
        db.sync();

        let metrics = db.metrics();
        assert_eq!(metrics.writes_enqueued, 5);
        assert_eq!(metrics.entries_committed, 5);
        assert!(metrics.batches_committed >= 1);
        assert!(metrics.bytes_released > 0);
    }
}
