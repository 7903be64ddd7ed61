//! `utxoroot-store` — persistent chainstate backing UTXO snapshots.
//!
//! Provides a redb-backed KV store with canonical coin-record layouts,
//! tag/length filtered coin scans, point lookups, and the published
//! snapshot manifest.

pub mod db;
pub mod keys;
pub mod manifest;

pub use db::{Store, WriteBatch};
pub use keys::{decode_coin_key, decode_coin_record, encode_coin_key, encode_coin_record};
pub use manifest::SnapshotManifest;
