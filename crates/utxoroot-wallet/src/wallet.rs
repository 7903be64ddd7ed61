use tracing::{debug, warn};
use utxoroot_core::{
    ErrorCode, SnapshotError, SnapshotWindow, UtxoRecord, UtxoSource, WalletOutputs,
};

use crate::keystore::Keystore;

/// Wallet view over a chainstate: every unspent output locked to a key the
/// keystore holds.
pub struct StoreWallet<'a, S: UtxoSource + ?Sized> {
    source: &'a S,
    keystore: &'a Keystore,
    window: SnapshotWindow,
}

impl<'a, S: UtxoSource + ?Sized> StoreWallet<'a, S> {
    pub fn new(source: &'a S, keystore: &'a Keystore) -> Self {
        Self {
            source,
            keystore,
            window: SnapshotWindow::all(),
        }
    }

    /// Restrict to outputs created inside `window`.
    pub fn with_window(mut self, window: SnapshotWindow) -> Self {
        self.window = window;
        self
    }
}

fn wallet_err(e: SnapshotError) -> SnapshotError {
    SnapshotError::new(ErrorCode::ClaimErrWallet, e.to_string())
}

impl<S: UtxoSource + ?Sized> WalletOutputs for StoreWallet<'_, S> {
    fn unspent_outputs(&self) -> Result<Vec<UtxoRecord>, SnapshotError> {
        let mut owned = Vec::new();
        self.source
            .scan(&mut |rec| {
                if !self.window.contains(rec.height) {
                    return;
                }
                for u in rec.utxos() {
                    if self.keystore.owns_script(&u.script) {
                        owned.push(u);
                    }
                }
            })
            .map_err(wallet_err)?;

        let mut out = Vec::with_capacity(owned.len());
        for u in owned {
            if self.source.is_unspent(&u.outpoint()).map_err(wallet_err)? {
                out.push(u);
            } else {
                warn!(vout = u.vout, "wallet output vanished between scan and lookup");
            }
        }
        out.sort_by_key(|u| u.outpoint());
        debug!(outputs = out.len(), keys = self.keystore.len(), "wallet outputs");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use utxoroot_core::{CoinOutput, CoinRecord, Hash32, MemorySource, Outpoint};

    fn coin(txid: u8, height: u64, scripts: &[Option<&[u8]>]) -> CoinRecord {
        CoinRecord {
            txid: [txid; 32],
            height,
            coinbase: false,
            outputs: scripts
                .iter()
                .map(|s| {
                    s.map(|script| CoinOutput {
                        amount: 1_000,
                        script: script.to_vec(),
                    })
                })
                .collect(),
        }
    }

    struct FailingSource;

    impl UtxoSource for FailingSource {
        fn scan(&self, _visit: &mut dyn FnMut(CoinRecord)) -> Result<u64, SnapshotError> {
            Err(SnapshotError::store("iterator: disk gone"))
        }

        fn coin(&self, _txid: &Hash32) -> Result<Option<CoinRecord>, SnapshotError> {
            Ok(None)
        }
    }

    #[test]
    fn lists_only_owned_unspent_outputs_in_window() {
        let mut ks = Keystore::new();
        let mine = ks.insert(SigningKey::from_bytes(&[3u8; 32]));
        let theirs = vec![0x01; 33];
        let src = MemorySource::new(vec![
            coin(0x10, 5, &[Some(&mine), Some(&theirs), None]),
            coin(0x20, 50, &[None, Some(&mine)]),
            coin(0x30, 500, &[Some(&mine)]),
        ]);

        let wallet = StoreWallet::new(&src, &ks).with_window(SnapshotWindow::up_to(100));
        let outs = wallet.unspent_outputs().unwrap();
        let points: Vec<Outpoint> = outs.iter().map(|u| u.outpoint()).collect();
        assert_eq!(
            points,
            vec![
                Outpoint { txid: [0x10; 32], vout: 0 },
                Outpoint { txid: [0x20; 32], vout: 1 },
            ]
        );
    }

    #[test]
    fn source_failure_maps_to_wallet_code() {
        let ks = Keystore::new();
        let err = StoreWallet::new(&FailingSource, &ks)
            .unspent_outputs()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClaimErrWallet);
        assert!(err.msg.contains("disk gone"), "{err}");
    }
}
