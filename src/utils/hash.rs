//! Fingerprints.
//!
//! - FxHash for naming generated files (e.g. `worker-a1b2c3d4.js`)
//! - blake3 for content identity of chunks and scripts

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Compute 64-bit hash from byte data.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Compute hash and return as 8-char hex fingerprint.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(value: &T) -> String {
    format!("{:016x}", compute(value))[..8].to_string()
}

/// Lowercase hex of a finished blake3 digest.
pub fn hex_digest(hasher: &blake3::Hasher) -> String {
    hex::encode(hasher.finalize().as_bytes())
}

/// 64-char hex blake3 of `data`.
pub fn content_hash<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    hex::encode(blake3::hash(data.as_ref()).as_bytes())
}

/// 64-char hex blake3 over `parts`, length-prefixed so boundaries count.
pub fn combined_hash(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hex_digest(&hasher)
}
