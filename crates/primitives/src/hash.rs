//! Hashing helpers.

use sha2::{Digest, Sha256};

use crate::Buf32;

/// Canonical hash type used for leaves, nodes and roots.
pub type Hash = Buf32;

/// Direct untagged SHA-256 hash of some bytes.
pub fn sha256(buf: &[u8]) -> Buf32 {
    let mut hasher = Sha256::new();
    hasher.update(buf);
    Buf32::from(<[u8; 32]>::from(hasher.finalize()))
}

/// SHA-256 over the concatenation of several byte slices, without copying them
/// into a single buffer first.
pub fn sha256_concat<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Buf32 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Buf32::from(<[u8; 32]>::from(hasher.finalize()))
}
