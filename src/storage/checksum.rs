//! CRC32 record checksums
//!
//! The checksum covers the key and the body, so a body filed under the
//! wrong key fails verification just like a flipped bit.

use crc32fast::Hasher;

/// CRC32 (IEEE) over `key` followed by `body`.
pub fn compute_checksum(key: &[u8], body: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&(key.len() as u64).to_le_bytes());
    hasher.update(key);
    hasher.update(body);
    hasher.finalize()
}

pub fn verify_checksum(key: &[u8], body: &[u8], expected: u32) -> bool {
    compute_checksum(key, body) == expected
}
