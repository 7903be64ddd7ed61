//! `utxoroot-core` — Merkle commitments, inclusion proofs and unlock claims
//! over a UTXO snapshot.

pub mod claim;
mod compactsize;
pub mod constants;
pub mod error;
mod hash;
pub mod leaf;
pub mod merkle;
pub mod proof;
pub mod snapshot;
pub mod types;
mod wire_read;

pub use claim::{
    ClaimBatch, ClaimBuilder, SkippedOutput, SpendSigner, SyntheticSpend, UnlockClaim,
    WalletOutputs,
};
pub use compactsize::{encode_compact_size, read_compact_size};
pub use error::{ErrorCode, SignError, SnapshotError};
pub use hash::{hash_pair, sha3_256};
pub use leaf::{checked_leaf_hash, leaf_hash};
pub use merkle::{merkle_root, HashList, SnapshotRoot};
pub use proof::{prove, verify_inclusion, verify_root, ProofPath, ProofStep};
pub use snapshot::{
    CollectStats, MemorySource, Snapshot, SnapshotCollector, SnapshotWindow, UtxoSource,
};
pub use types::{CoinOutput, CoinRecord, Hash32, Outpoint, UtxoRecord};
pub use wire_read::Reader;
