//! Storage key layout
//!
//! ```text
//! <collection name> 0x00 <id tag> <id bytes>
//! ```
//!
//! Collection names cannot contain NUL, so the separator keeps every
//! collection's keys in one contiguous range. Integer ids of either
//! width are keyed as Int64 so that `42` and `42L` name the same
//! document.

use bson::spec::ElementType;
use bson::Bson;

use super::errors::{DatabaseError, DatabaseResult};

const SEPARATOR: u8 = 0x00;

/// Rejects names that would break the key layout.
pub fn validate_collection_name(name: &str) -> DatabaseResult<()> {
    if name.is_empty() || name.as_bytes().contains(&SEPARATOR) {
        return Err(DatabaseError::InvalidCollectionName(name.to_string()));
    }
    Ok(())
}

/// Key prefix shared by every document of a collection
pub fn collection_prefix(name: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(name.len() + 1);
    prefix.extend_from_slice(name.as_bytes());
    prefix.push(SEPARATOR);
    prefix
}

/// Full storage key of the document with `_id` equal to `id`.
pub fn document_key(prefix: &[u8], id: &Bson) -> DatabaseResult<Vec<u8>> {
    let mut key = prefix.to_vec();
    match id {
        Bson::ObjectId(oid) => {
            key.push(ElementType::ObjectId as u8);
            key.extend_from_slice(&oid.bytes());
        }
        Bson::String(s) => {
            key.push(ElementType::String as u8);
            key.extend_from_slice(s.as_bytes());
        }
        Bson::Int32(n) => push_int(&mut key, i64::from(*n)),
        Bson::Int64(n) => push_int(&mut key, *n),
        other => {
            return Err(DatabaseError::UnsupportedId(format!(
                "{:?}",
                other.element_type()
            )))
        }
    }
    Ok(key)
}

fn push_int(key: &mut Vec<u8>, n: i64) {
    key.push(ElementType::Int64 as u8);
    // Sign bit flipped so byte order matches numeric order.
    key.extend_from_slice(&((n as u64) ^ (1 << 63)).to_be_bytes());
}
