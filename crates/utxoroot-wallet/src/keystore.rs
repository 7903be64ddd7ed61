//! Ed25519 keystore and the claim signer built on it.
//!
//! Owned outputs are locked by `suite[1] || pubkey[32]` scripts. The keystore
//! signs the synthetic-spend digest of any output whose script names one of
//! its keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use utxoroot_core::{SignError, SpendSigner, SyntheticSpend};

use crate::io_utils::{parse_hex32, write_file_0600};

pub const KEYSTORE_VERSION: &str = "UTXKSv1";
pub const SUITE_ID_ED25519: u8 = 0x01;
pub const P2PK_SCRIPT_BYTES: usize = 1 + 32;

pub fn p2pk_script(key: &VerifyingKey) -> Vec<u8> {
    let mut script = Vec::with_capacity(P2PK_SCRIPT_BYTES);
    script.push(SUITE_ID_ED25519);
    script.extend_from_slice(key.as_bytes());
    script
}

/// Public key named by a P2PK script, or `None` for any other script shape.
pub fn parse_p2pk_script(script: &[u8]) -> Option<[u8; 32]> {
    if script.len() != P2PK_SCRIPT_BYTES || script[0] != SUITE_ID_ED25519 {
        return None;
    }
    let mut pk = [0u8; 32];
    pk.copy_from_slice(&script[1..]);
    Some(pk)
}

/// The check a destination verifier runs on an unlock claim's authorization.
pub fn verify_authorization(script: &[u8], spend: &SyntheticSpend, authorization: &[u8]) -> bool {
    let Some(pk) = parse_p2pk_script(script) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(&pk) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(authorization) else {
        return false;
    };
    key.verify_strict(&spend.sighash(), &sig).is_ok()
}

#[derive(Serialize, Deserialize)]
struct KeystoreDisk {
    version: String,
    keys: Vec<KeyDiskEntry>,
}

#[derive(Serialize, Deserialize)]
struct KeyDiskEntry {
    sk_hex: String,
}

#[derive(Default)]
pub struct Keystore {
    keys: BTreeMap<[u8; 32], SigningKey>,
}

impl Keystore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Add a key; returns its locking script.
    pub fn insert(&mut self, key: SigningKey) -> Vec<u8> {
        let script = p2pk_script(&key.verifying_key());
        self.keys.insert(key.verifying_key().to_bytes(), key);
        script
    }

    pub fn generate<R: CryptoRngCore + ?Sized>(&mut self, rng: &mut R) -> Vec<u8> {
        self.insert(SigningKey::generate(rng))
    }

    /// Locking script for a held public key.
    pub fn script_for(&self, pubkey: &[u8; 32]) -> Option<Vec<u8>> {
        self.keys
            .get(pubkey)
            .map(|k| p2pk_script(&k.verifying_key()))
    }

    pub fn scripts(&self) -> Vec<Vec<u8>> {
        self.keys.values().map(|k| p2pk_script(&k.verifying_key())).collect()
    }

    pub fn owns_script(&self, script: &[u8]) -> bool {
        parse_p2pk_script(script).is_some_and(|pk| self.keys.contains_key(&pk))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path).map_err(|e| format!("read keystore: {e}"))?;
        let disk: KeystoreDisk =
            serde_json::from_str(&raw).map_err(|e| format!("keystore json: {e}"))?;
        if disk.version != KEYSTORE_VERSION {
            return Err(format!("unsupported keystore version: {:?}", disk.version));
        }
        let mut ks = Self::new();
        for (i, entry) in disk.keys.iter().enumerate() {
            let sk = parse_hex32(&format!("keys[{i}].sk_hex"), &entry.sk_hex)?;
            ks.insert(SigningKey::from_bytes(&sk));
        }
        Ok(ks)
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let disk = KeystoreDisk {
            version: KEYSTORE_VERSION.to_string(),
            keys: self
                .keys
                .values()
                .map(|k| KeyDiskEntry {
                    sk_hex: hex::encode(k.to_bytes()),
                })
                .collect(),
        };
        let mut bytes =
            serde_json::to_vec_pretty(&disk).map_err(|e| format!("encode keystore: {e}"))?;
        bytes.push(b'\n');
        write_file_0600(path, &bytes)
    }
}

impl SpendSigner for Keystore {
    fn sign_spend(&self, spend: &SyntheticSpend) -> Result<Vec<u8>, SignError> {
        let pk = parse_p2pk_script(&spend.prev_script).ok_or(SignError::UnsupportedScript)?;
        let key = self.keys.get(&pk).ok_or(SignError::KeyUnavailable)?;
        Ok(key.sign(&spend.sighash()).to_bytes().to_vec())
    }
}
