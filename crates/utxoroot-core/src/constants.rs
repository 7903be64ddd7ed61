/// Key tag of coin records in the chainstate keyspace.
pub const COIN_RECORD_TAG: u8 = b'c';
/// Coin keys are `tag || txid`.
pub const COIN_KEY_BYTES: usize = 1 + 32;

/// Key of the chain tip height record.
pub const TIP_HEIGHT_KEY: &[u8] = b"B";

pub const CLAIM_SIGHASH_DST: &[u8] = b"UTXOROOT-claim-sighash/";

/// Placeholder destination for synthetic claim spends (unspendable marker).
pub const PLACEHOLDER_DESTINATION: &[u8] = &[0x6a];

pub const MAX_OUTPUTS_PER_RECORD: u64 = 1 << 16;
pub const MAX_SCRIPT_BYTES: u64 = 10_000;
