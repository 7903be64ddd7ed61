//! `utxoroot-wallet` — ed25519 keystore and the wallet side of unlock claims.

pub mod io_utils;
pub mod keystore;
pub mod wallet;

pub use keystore::{
    p2pk_script, parse_p2pk_script, verify_authorization, Keystore, KEYSTORE_VERSION,
    P2PK_SCRIPT_BYTES, SUITE_ID_ED25519,
};
pub use wallet::StoreWallet;
