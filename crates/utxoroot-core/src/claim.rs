//! Unlock claims for wallet-owned outputs.
//!
//! A claim pairs an output's leaf data with an authorization over a synthetic
//! single-input, single-output spend of that output. The destination verifier
//! accepts it when the leaf is proven under a published root and the
//! authorization checks out against the output's locking script.

use tracing::{debug, info};

use crate::compactsize::encode_compact_size;
use crate::constants::{CLAIM_SIGHASH_DST, PLACEHOLDER_DESTINATION};
use crate::error::{SignError, SnapshotError};
use crate::hash::sha3_256;
use crate::leaf::leaf_hash;
use crate::types::{Hash32, Outpoint, UtxoRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntheticSpend {
    pub prev_txid: Hash32,
    pub prev_vout: u32,
    pub amount: i64,
    pub prev_script: Vec<u8>,
    pub destination: Vec<u8>,
    pub leaf: Hash32,
}

impl SyntheticSpend {
    pub fn for_output(utxo: &UtxoRecord, destination: &[u8]) -> Self {
        Self {
            prev_txid: utxo.txid,
            prev_vout: utxo.vout,
            amount: utxo.amount,
            prev_script: utxo.script.clone(),
            destination: destination.to_vec(),
            leaf: leaf_hash(&utxo.txid, &utxo.script, utxo.amount),
        }
    }

    /// Digest the signer commits to. Binds the leaf so an authorization is
    /// only usable together with that leaf's inclusion proof.
    pub fn sighash(&self) -> Hash32 {
        let mut preimage = Vec::new();
        preimage.extend_from_slice(CLAIM_SIGHASH_DST);
        preimage.extend_from_slice(&self.prev_txid);
        preimage.extend_from_slice(&self.prev_vout.to_le_bytes());
        preimage.extend_from_slice(&self.amount.to_le_bytes());
        encode_compact_size(self.prev_script.len() as u64, &mut preimage);
        preimage.extend_from_slice(&self.prev_script);
        encode_compact_size(self.destination.len() as u64, &mut preimage);
        preimage.extend_from_slice(&self.destination);
        preimage.extend_from_slice(&self.leaf);
        sha3_256(&preimage)
    }
}

/// Produces an authorization for spending an output, keyed by its locking
/// script (`spend.prev_script`).
pub trait SpendSigner {
    fn sign_spend(&self, spend: &SyntheticSpend) -> Result<Vec<u8>, SignError>;
}

/// Outputs the wallet owns, already confirmed unspent against the store.
pub trait WalletOutputs {
    fn unspent_outputs(&self) -> Result<Vec<UtxoRecord>, SnapshotError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlockClaim {
    pub txid: Hash32,
    pub vout: u32,
    pub script: Vec<u8>,
    pub amount: i64,
    pub leaf: Hash32,
    pub authorization: Vec<u8>,
}

impl UnlockClaim {
    pub fn outpoint(&self) -> Outpoint {
        Outpoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedOutput {
    pub outpoint: Outpoint,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimBatch {
    pub claims: Vec<UnlockClaim>,
    pub skipped: Vec<SkippedOutput>,
}

impl ClaimBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

pub struct ClaimBuilder<'a> {
    signer: &'a dyn SpendSigner,
    destination: Vec<u8>,
}

impl<'a> ClaimBuilder<'a> {
    pub fn new(signer: &'a dyn SpendSigner) -> Self {
        Self {
            signer,
            destination: PLACEHOLDER_DESTINATION.to_vec(),
        }
    }

    pub fn with_destination(mut self, destination: Vec<u8>) -> Self {
        self.destination = destination;
        self
    }

    pub fn destination(&self) -> &[u8] {
        &self.destination
    }

    /// Sign each output independently. Failures land in `skipped`; they
    /// never abort the batch.
    pub fn build_claims(&self, outputs: &[UtxoRecord]) -> ClaimBatch {
        let mut batch = ClaimBatch::default();
        for utxo in outputs {
            if !utxo.is_spendable() {
                debug!(vout = utxo.vout, amount = utxo.amount, "claim skip: not spendable");
                batch.skipped.push(SkippedOutput {
                    outpoint: utxo.outpoint(),
                    reason: "not spendable".to_string(),
                });
                continue;
            }

            let spend = SyntheticSpend::for_output(utxo, &self.destination);
            match self.signer.sign_spend(&spend) {
                Ok(authorization) => batch.claims.push(UnlockClaim {
                    txid: utxo.txid,
                    vout: utxo.vout,
                    script: utxo.script.clone(),
                    amount: utxo.amount,
                    leaf: spend.leaf,
                    authorization,
                }),
                Err(e) => {
                    debug!(vout = utxo.vout, error = %e, "claim skip: signing failed");
                    batch.skipped.push(SkippedOutput {
                        outpoint: utxo.outpoint(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            claims = batch.claims.len(),
            skipped = batch.skipped.len(),
            "claim batch built"
        );
        batch
    }

    pub fn build_wallet_claims(
        &self,
        wallet: &dyn WalletOutputs,
    ) -> Result<ClaimBatch, SnapshotError> {
        let outputs = wallet.unspent_outputs()?;
        Ok(self.build_claims(&outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysSign;

    impl SpendSigner for AlwaysSign {
        fn sign_spend(&self, spend: &SyntheticSpend) -> Result<Vec<u8>, SignError> {
            Ok(spend.sighash().to_vec())
        }
    }

    struct NeverSign;

    impl SpendSigner for NeverSign {
        fn sign_spend(&self, _spend: &SyntheticSpend) -> Result<Vec<u8>, SignError> {
            Err(SignError::KeyUnavailable)
        }
    }

    fn utxo(amount: i64) -> UtxoRecord {
        UtxoRecord {
            txid: [0x42; 32],
            vout: 3,
            script: vec![0x01; 33],
            amount,
            height: 12,
        }
    }

    #[test]
    fn claim_mirrors_source_record() {
        let src = utxo(5000);
        let batch = ClaimBuilder::new(&AlwaysSign).build_claims(std::slice::from_ref(&src));
        assert_eq!(batch.skipped_count(), 0);
        let claim = &batch.claims[0];
        assert!(!claim.authorization.is_empty());
        assert_eq!(claim.txid, src.txid);
        assert_eq!(claim.vout, src.vout);
        assert_eq!(claim.script, src.script);
        assert_eq!(claim.amount, src.amount);
        assert_eq!(Some(claim.leaf), src.leaf_hash());
    }

    #[test]
    fn signing_failure_is_reported_not_raised() {
        let batch = ClaimBuilder::new(&NeverSign).build_claims(&[utxo(5000)]);
        assert!(batch.claims.is_empty());
        assert_eq!(batch.skipped_count(), 1);
        assert_eq!(batch.skipped[0].outpoint, utxo(1).outpoint());
        assert_eq!(batch.skipped[0].reason, SignError::KeyUnavailable.to_string());
    }

    #[test]
    fn unspendable_outputs_are_skipped() {
        let batch = ClaimBuilder::new(&AlwaysSign).build_claims(&[utxo(0), utxo(9)]);
        assert_eq!(batch.claims.len(), 1);
        assert_eq!(batch.skipped[0].reason, "not spendable");
    }

    #[test]
    fn sighash_commits_to_destination_and_leaf() {
        let base = SyntheticSpend::for_output(&utxo(10), PLACEHOLDER_DESTINATION);
        let mut other_dest = base.clone();
        other_dest.destination = vec![0x00];
        let mut other_leaf = base.clone();
        other_leaf.leaf[0] ^= 1;
        assert_ne!(base.sighash(), other_dest.sighash());
        assert_ne!(base.sighash(), other_leaf.sighash());
    }

    #[test]
    fn custom_destination_flows_into_spend() {
        struct Capture;
        impl SpendSigner for Capture {
            fn sign_spend(&self, spend: &SyntheticSpend) -> Result<Vec<u8>, SignError> {
                Ok(spend.destination.clone())
            }
        }
        let batch = ClaimBuilder::new(&Capture)
            .with_destination(vec![0xaa, 0xbb])
            .build_claims(&[utxo(1)]);
        assert_eq!(batch.claims[0].authorization, vec![0xaa, 0xbb]);
    }
}
