//! BLAKE2s-256 hashing
//!
//! Seed expansion and chain-digest derivation both hash with BLAKE2s-256 over
//! plain byte concatenation. Parts are absorbed in order with no length
//! prefixes, so callers own the framing (fixed-width fields only).

use blake2::{Blake2s256, Digest};

/// Width of every digest produced here.
pub const DIGEST_LEN: usize = 32;

/// BLAKE2s-256 of a byte slice.
pub fn blake2s(data: &[u8]) -> [u8; DIGEST_LEN] {
    blake2s_concat(&[data])
}

/// BLAKE2s-256 of the concatenation of `parts`.
pub fn blake2s_concat(parts: &[&[u8]]) -> [u8; DIGEST_LEN] {
    let mut hasher = Blake2s256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Encodes `value` as a 32-byte big-endian integer.
pub fn be_u64_padded(value: u64) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out[DIGEST_LEN - 8..].copy_from_slice(&value.to_be_bytes());
    out
}
