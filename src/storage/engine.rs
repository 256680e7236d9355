//! Storage engine interface and the in-memory B-tree store
//!
//! The engine admits one write transaction at a time. Readers never block
//! on a pending transaction: staged operations stay private until commit,
//! which applies all of them under one write lock.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use bson::RawDocument;

use super::errors::{StorageError, StorageResult};
use super::record::StoredRecord;

/// Visitor for `scan_prefix`: receives each key and verified document.
/// Return `false` to stop the scan early.
pub type ScanVisitor<'v> = dyn FnMut(&[u8], &RawDocument) -> bool + 'v;

/// A key-ordered document store with a single writer.
pub trait StorageEngine: Send + Sync {
    /// Opens the write transaction.
    ///
    /// # Errors
    ///
    /// `LODE_STORAGE_WRITER_BUSY` (retryable) while another transaction
    /// is open.
    fn begin_write(&self) -> StorageResult<Box<dyn WriteTransaction + '_>>;

    /// Reads and verifies the document under `key`.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Visits every document whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8], visitor: &mut ScanVisitor<'_>) -> StorageResult<()>;

    /// Number of stored documents
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Staged writes. Dropping without `commit` discards them.
pub trait WriteTransaction {
    /// Stages `value` under `key`.
    ///
    /// # Errors
    ///
    /// `LODE_STORAGE_INVALID_DOCUMENT` if `value` is not a BSON document;
    /// nothing is staged in that case.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Stages removal of `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;

    /// Number of staged operations
    fn staged(&self) -> usize;

    /// Applies every staged operation at once.
    fn commit(self: Box<Self>) -> StorageResult<()>;
}

enum StagedOp {
    Put(Vec<u8>, StoredRecord),
    Delete(Vec<u8>),
}

/// In-memory store: a `BTreeMap` of checksummed records.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<Vec<u8>, StoredRecord>>,
    writer: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_records(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, BTreeMap<Vec<u8>, StoredRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn corrupt(&self, key: &[u8]) {
        let mut records = self.records.write().unwrap();
        let record = records.get_mut(key).unwrap();
        let body = record.body_mut();
        let last = body.len() - 2;
        body[last] ^= 0xff;
    }
}

impl StorageEngine for MemoryStore {
    fn begin_write(&self) -> StorageResult<Box<dyn WriteTransaction + '_>> {
        let guard = match self.writer.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(StorageError::writer_busy()),
            // A writer panicked mid-transaction; nothing it staged was applied.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        Ok(Box::new(MemoryTransaction {
            store: self,
            _guard: guard,
            ops: Vec::new(),
        }))
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let records = self.read_records();
        match records.get(key) {
            Some(record) => Ok(Some(record.verify(key)?.as_bytes().to_vec())),
            None => Ok(None),
        }
    }

    fn scan_prefix(&self, prefix: &[u8], visitor: &mut ScanVisitor<'_>) -> StorageResult<()> {
        let records = self.read_records();
        let range = records.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        for (key, record) in range {
            if !key.starts_with(prefix) {
                break;
            }
            let doc = record.verify(key)?;
            if !visitor(key, doc) {
                break;
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.read_records().len()
    }
}

struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    _guard: MutexGuard<'a, ()>,
    ops: Vec<StagedOp>,
}

impl WriteTransaction for MemoryTransaction<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let record = StoredRecord::seal(key, value.to_vec())?;
        self.ops.push(StagedOp::Put(key.to_vec(), record));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        self.ops.push(StagedOp::Delete(key.to_vec()));
        Ok(())
    }

    fn staged(&self) -> usize {
        self.ops.len()
    }

    fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction { store, ops, .. } = *self;
        let mut records = store
            .records
            .write()
            .map_err(|_| StorageError::write_failed("record map poisoned"))?;
        for op in ops {
            match op {
                StagedOp::Put(key, record) => {
                    records.insert(key, record);
                }
                StagedOp::Delete(key) => {
                    records.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::errors::StorageErrorCode;
    use bson::rawdoc;

    fn doc_bytes(n: i32) -> Vec<u8> {
        rawdoc! { "n": n }.into_bytes()
    }

    #[test]
    fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();
        let mut txn = store.begin_write().unwrap();
        txn.put(b"a", &doc_bytes(1)).unwrap();
        txn.put(b"b", &doc_bytes(2)).unwrap();
        assert_eq!(txn.staged(), 2);
        assert_eq!(store.len(), 0, "staged writes are private");
        txn.commit().unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(b"a").unwrap(), Some(doc_bytes(1)));
    }

    #[test]
    fn test_drop_aborts() {
        let store = MemoryStore::new();
        {
            let mut txn = store.begin_write().unwrap();
            txn.put(b"a", &doc_bytes(1)).unwrap();
        }
        assert!(store.is_empty());
        assert!(store.begin_write().is_ok(), "writer lock released on drop");
    }

    #[test]
    fn test_second_writer_is_busy() {
        let store = MemoryStore::new();
        let _txn = store.begin_write().unwrap();
        let err = store.begin_write().err().unwrap();
        assert_eq!(err.code(), StorageErrorCode::LodeStorageWriterBusy);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_put_rejects_invalid_document() {
        let store = MemoryStore::new();
        let mut txn = store.begin_write().unwrap();
        let err = txn.put(b"bad", b"\x05\x00").unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::LodeStorageInvalidDocument);
        assert_eq!(txn.staged(), 0);
    }

    #[test]
    fn test_delete_and_overwrite() {
        let store = MemoryStore::new();
        let mut txn = store.begin_write().unwrap();
        txn.put(b"a", &doc_bytes(1)).unwrap();
        txn.put(b"b", &doc_bytes(2)).unwrap();
        txn.commit().unwrap();

        let mut txn = store.begin_write().unwrap();
        txn.put(b"a", &doc_bytes(10)).unwrap();
        txn.delete(b"b").unwrap();
        txn.delete(b"missing").unwrap();
        txn.commit().unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(doc_bytes(10)));
        assert_eq!(store.get(b"b").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_scan_prefix_in_key_order() {
        let store = MemoryStore::new();
        let mut txn = store.begin_write().unwrap();
        txn.put(b"users\0b", &doc_bytes(2)).unwrap();
        txn.put(b"users\0a", &doc_bytes(1)).unwrap();
        txn.put(b"usersx\0a", &doc_bytes(9)).unwrap();
        txn.put(b"orders\0a", &doc_bytes(7)).unwrap();
        txn.commit().unwrap();

        let mut seen = Vec::new();
        store
            .scan_prefix(b"users\0", &mut |key, doc| {
                seen.push((key.to_vec(), doc.get_i32("n").unwrap()));
                true
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![(b"users\0a".to_vec(), 1), (b"users\0b".to_vec(), 2)]
        );
    }

    #[test]
    fn test_scan_stops_when_visitor_declines() {
        let store = MemoryStore::new();
        let mut txn = store.begin_write().unwrap();
        for (i, key) in [b"p1", b"p2", b"p3"].iter().enumerate() {
            txn.put(*key, &doc_bytes(i as i32)).unwrap();
        }
        txn.commit().unwrap();

        let mut visited = 0;
        store
            .scan_prefix(b"p", &mut |_, _| {
                visited += 1;
                false
            })
            .unwrap();
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_corruption_detected_on_read() {
        let store = MemoryStore::new();
        let mut txn = store.begin_write().unwrap();
        txn.put(b"a", &doc_bytes(5)).unwrap();
        txn.commit().unwrap();

        store.corrupt(b"a");
        let err = store.get(b"a").unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::LodeDataCorruption);
        assert!(store.scan_prefix(b"", &mut |_, _| true).is_err());
    }
}
