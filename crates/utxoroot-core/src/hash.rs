use sha3::{Digest, Sha3_256};

use crate::types::Hash32;

pub fn sha3_256(b: &[u8]) -> Hash32 {
    let mut h = Sha3_256::new();
    h.update(b);
    let out = h.finalize();
    let mut r = [0u8; 32];
    r.copy_from_slice(&out);
    r
}

/// Interior node: H(left || right). No domain tag; remote verifiers hash the
/// plain 64-byte concatenation.
pub fn hash_pair(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut h = Sha3_256::new();
    h.update(left);
    h.update(right);
    let out = h.finalize();
    let mut r = [0u8; 32];
    r.copy_from_slice(&out);
    r
}
