//! Leaf commitment for a single output.
//!
//! leaf = SHA3-256( txid[32] || script || amount_le[8] )
//!
//! The txid is always bound: two outputs with the same script and amount in
//! different transactions must never share a leaf.

use sha3::{Digest, Sha3_256};

use crate::types::{Hash32, UtxoRecord};

pub fn leaf_hash(txid: &Hash32, script: &[u8], amount: i64) -> Hash32 {
    let mut h = Sha3_256::new();
    h.update(txid);
    h.update(script);
    h.update(amount.to_le_bytes());
    let out = h.finalize();
    let mut r = [0u8; 32];
    r.copy_from_slice(&out);
    r
}

/// `None` for outputs that cannot be claimed (zero or negative amount).
pub fn checked_leaf_hash(txid: &Hash32, script: &[u8], amount: i64) -> Option<Hash32> {
    if amount <= 0 {
        return None;
    }
    Some(leaf_hash(txid, script, amount))
}

impl UtxoRecord {
    pub fn leaf_hash(&self) -> Option<Hash32> {
        checked_leaf_hash(&self.txid, &self.script, self.amount)
    }
}
