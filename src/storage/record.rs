//! Stored records
//!
//! A record is the raw BSON body of one document plus the CRC32 sealed
//! over key and body when it was committed. Reads verify the checksum
//! before handing the body out.

use bson::raw::{RawArray, RawBsonRef, RawDocument};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StorageError, StorageResult};

/// One committed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    body: Vec<u8>,
    checksum: u32,
}

impl StoredRecord {
    /// Validates `body` as a BSON document and seals it under `key`.
    ///
    /// # Errors
    ///
    /// `LODE_STORAGE_INVALID_DOCUMENT` naming `key` if the body is not a
    /// well-formed document at every nesting level.
    pub fn seal(key: &[u8], body: Vec<u8>) -> StorageResult<Self> {
        validate_document(key, &body)?;
        let checksum = compute_checksum(key, &body);
        Ok(Self { body, checksum })
    }

    /// Verifies the record against `key` and borrows its document.
    ///
    /// # Errors
    ///
    /// `LODE_DATA_CORRUPTION` on checksum mismatch or unparseable body.
    pub fn verify(&self, key: &[u8]) -> StorageResult<&RawDocument> {
        if !verify_checksum(key, &self.body, self.checksum) {
            return Err(StorageError::data_corruption(key, "checksum mismatch"));
        }
        RawDocument::from_bytes(&self.body)
            .map_err(|e| StorageError::data_corruption(key, e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn body_mut(&mut self) -> &mut Vec<u8> {
        &mut self.body
    }
}

/// Walks every element of `bytes` as BSON, descending into embedded
/// documents and arrays.
pub fn validate_document<'a>(key: &[u8], bytes: &'a [u8]) -> StorageResult<&'a RawDocument> {
    let doc = RawDocument::from_bytes(bytes)
        .map_err(|e| StorageError::invalid_document(key, e.to_string()))?;
    walk_document(doc).map_err(|reason| StorageError::invalid_document(key, reason))?;
    Ok(doc)
}

fn walk_document(doc: &RawDocument) -> Result<(), String> {
    for element in doc {
        let (_, value) = element.map_err(|e| e.to_string())?;
        walk_value(value)?;
    }
    Ok(())
}

fn walk_array(array: &RawArray) -> Result<(), String> {
    for element in array {
        walk_value(element.map_err(|e| e.to_string())?)?;
    }
    Ok(())
}

fn walk_value(value: RawBsonRef<'_>) -> Result<(), String> {
    match value {
        RawBsonRef::Document(doc) => walk_document(doc),
        RawBsonRef::Array(array) => walk_array(array),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::errors::StorageErrorCode;
    use bson::rawdoc;

    #[test]
    fn test_seal_and_verify() {
        let body = rawdoc! { "a": 42, "nested": { "b": [1, 2, 3] } }.into_bytes();
        let record = StoredRecord::seal(b"k", body.clone()).unwrap();
        let doc = record.verify(b"k").unwrap();
        assert_eq!(doc.as_bytes(), &body[..]);
        assert_eq!(record.len(), body.len());
    }

    #[test]
    fn test_seal_rejects_garbage() {
        let err = StoredRecord::seal(b"bad", vec![1, 2, 3]).unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::LodeStorageInvalidDocument);
        assert_eq!(err.key(), Some(&b"bad"[..]));
    }

    #[test]
    fn test_seal_rejects_empty() {
        assert!(StoredRecord::seal(b"k", Vec::new()).is_err());
    }

    #[test]
    fn test_seal_rejects_bad_nested_element() {
        let mut body = rawdoc! { "n": { "s": "abc" } }.into_bytes();
        // Inner string length prefix claims more bytes than exist.
        let pos = body.windows(4).position(|w| w == [4, 0, 0, 0]).unwrap();
        body[pos] = 60;
        assert!(StoredRecord::seal(b"k", body).is_err());
    }

    #[test]
    fn test_verify_detects_corruption() {
        let body = rawdoc! { "a": "hello" }.into_bytes();
        let mut record = StoredRecord::seal(b"k", body).unwrap();
        let last = record.body_mut().len() - 3;
        record.body_mut()[last] ^= 0xff;

        let err = record.verify(b"k").unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.code(), StorageErrorCode::LodeDataCorruption);
    }

    #[test]
    fn test_verify_detects_wrong_key() {
        let record = StoredRecord::seal(b"k1", rawdoc! { "a": 1 }.into_bytes()).unwrap();
        assert!(record.verify(b"k2").unwrap_err().is_fatal());
    }
}
