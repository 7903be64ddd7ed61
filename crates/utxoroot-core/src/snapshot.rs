//! Snapshot collection over a UTXO source.
//!
//! Every collection is a full scan. The resulting leaf list is sorted so the
//! root and proofs depend only on the set of eligible outputs, never on the
//! order the store happens to yield records in.

use tracing::{debug, info};

use crate::error::{ErrorCode, SnapshotError};
use crate::merkle::{merkle_root, HashList, SnapshotRoot};
use crate::proof::{prove, ProofPath};
use crate::types::{CoinRecord, Hash32, Outpoint};

/// Inclusive block-height range of outputs eligible for a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotWindow {
    pub height_min: u64,
    pub height_max: u64,
}

impl SnapshotWindow {
    pub fn new(height_min: u64, height_max: u64) -> Result<Self, SnapshotError> {
        if height_min > height_max {
            return Err(SnapshotError::new(
                ErrorCode::SnapshotErrWindow,
                format!("height_min {height_min} > height_max {height_max}"),
            ));
        }
        Ok(Self {
            height_min,
            height_max,
        })
    }

    pub fn all() -> Self {
        Self {
            height_min: 0,
            height_max: u64::MAX,
        }
    }

    pub fn up_to(tip_height: u64) -> Self {
        Self {
            height_min: 0,
            height_max: tip_height,
        }
    }

    pub fn contains(&self, height: u64) -> bool {
        self.height_min <= height && height <= self.height_max
    }
}

impl Default for SnapshotWindow {
    fn default() -> Self {
        Self::all()
    }
}

/// Read access to the coin records of a chainstate.
///
/// Each `scan` call must be an independent pass from the first record; the
/// collector never keeps a cursor between calls.
pub trait UtxoSource {
    /// Visit every well-formed coin record once. Returns how many records
    /// were skipped as malformed.
    fn scan(&self, visit: &mut dyn FnMut(CoinRecord)) -> Result<u64, SnapshotError>;

    fn coin(&self, txid: &Hash32) -> Result<Option<CoinRecord>, SnapshotError>;

    fn is_unspent(&self, outpoint: &Outpoint) -> Result<bool, SnapshotError> {
        Ok(self
            .coin(&outpoint.txid)?
            .is_some_and(|rec| rec.output(outpoint.vout).is_some()))
    }
}

/// In-memory source for tests and offline tooling.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    records: Vec<CoinRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<CoinRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: CoinRecord) {
        self.records.push(record);
    }
}

impl UtxoSource for MemorySource {
    fn scan(&self, visit: &mut dyn FnMut(CoinRecord)) -> Result<u64, SnapshotError> {
        for rec in &self.records {
            visit(rec.clone());
        }
        Ok(0)
    }

    fn coin(&self, txid: &Hash32) -> Result<Option<CoinRecord>, SnapshotError> {
        Ok(self.records.iter().find(|r| r.txid == *txid).cloned())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub records_scanned: u64,
    pub outputs_seen: u64,
    pub outside_window: u64,
    pub unspendable: u64,
    pub included: u64,
    pub malformed_skipped: u64,
}

/// Sorted leaf list of one snapshot. Collect once, then take the root and as
/// many proofs as needed from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub window: SnapshotWindow,
    pub leaves: HashList,
    pub stats: CollectStats,
}

impl Snapshot {
    pub fn from_leaves(window: SnapshotWindow, leaves: Vec<Hash32>) -> Self {
        let leaves = HashList::from_unsorted(leaves);
        let stats = CollectStats {
            included: leaves.len() as u64,
            ..CollectStats::default()
        };
        Self {
            window,
            leaves,
            stats,
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn root(&self) -> SnapshotRoot {
        merkle_root(&self.leaves)
    }

    pub fn index_of(&self, leaf: &Hash32) -> Option<usize> {
        self.leaves.index_of(leaf)
    }

    pub fn prove(&self, index: usize) -> Option<ProofPath> {
        prove(&self.leaves, index)
    }

    /// Proof for a leaf hash, or `None` if it is not part of this snapshot.
    pub fn prove_leaf(&self, leaf: &Hash32) -> Option<(usize, ProofPath)> {
        let index = self.index_of(leaf)?;
        self.prove(index).map(|path| (index, path))
    }
}

pub struct SnapshotCollector<'a, S: UtxoSource + ?Sized> {
    source: &'a S,
    window: SnapshotWindow,
}

impl<'a, S: UtxoSource + ?Sized> SnapshotCollector<'a, S> {
    pub fn new(source: &'a S, window: SnapshotWindow) -> Self {
        Self { source, window }
    }

    pub fn collect(&self) -> Result<Snapshot, SnapshotError> {
        let window = self.window;
        let mut stats = CollectStats::default();
        let mut leaves = Vec::new();

        let malformed = self.source.scan(&mut |rec: CoinRecord| {
            stats.records_scanned += 1;
            if !window.contains(rec.height) {
                stats.outside_window += rec.utxos().count() as u64;
                return;
            }
            for utxo in rec.utxos() {
                stats.outputs_seen += 1;
                match utxo.leaf_hash() {
                    Some(leaf) => leaves.push(leaf),
                    None => {
                        stats.unspendable += 1;
                        debug!(vout = utxo.vout, amount = utxo.amount, "skip unspendable output");
                    }
                }
            }
        })?;

        stats.malformed_skipped = malformed;
        let leaves = HashList::from_unsorted(leaves);
        stats.included = leaves.len() as u64;
        info!(
            height_min = window.height_min,
            height_max = window.height_max,
            records = stats.records_scanned,
            included = stats.included,
            outside_window = stats.outside_window,
            unspendable = stats.unspendable,
            malformed = stats.malformed_skipped,
            "snapshot collected"
        );

        Ok(Snapshot {
            window,
            leaves,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::leaf_hash;
    use crate::types::CoinOutput;

    fn coin(txid: u8, height: u64, outputs: &[Option<i64>]) -> CoinRecord {
        CoinRecord {
            txid: [txid; 32],
            height,
            coinbase: false,
            outputs: outputs
                .iter()
                .map(|a| {
                    a.map(|amount| CoinOutput {
                        amount,
                        script: vec![0x01, txid],
                    })
                })
                .collect(),
        }
    }

    #[test]
    fn window_rejects_inverted_range() {
        let err = SnapshotWindow::new(10, 9).unwrap_err();
        assert_eq!(err.code, ErrorCode::SnapshotErrWindow);
        assert!(SnapshotWindow::new(9, 9).unwrap().contains(9));
    }

    #[test]
    fn collect_filters_window_and_amount() {
        let src = MemorySource::new(vec![
            coin(1, 50, &[Some(10), Some(0), None, Some(-3)]),
            coin(2, 100, &[Some(7)]),
            coin(3, 101, &[Some(9)]),
        ]);
        let window = SnapshotWindow::new(0, 100).unwrap();
        let snap = SnapshotCollector::new(&src, window).collect().unwrap();

        let mut want = vec![
            leaf_hash(&[1; 32], &[0x01, 1], 10),
            leaf_hash(&[2; 32], &[0x01, 2], 7),
        ];
        want.sort();
        assert_eq!(snap.leaves.as_slice(), want.as_slice());
        assert_eq!(snap.stats.records_scanned, 3);
        assert_eq!(snap.stats.outputs_seen, 4);
        assert_eq!(snap.stats.unspendable, 2);
        assert_eq!(snap.stats.outside_window, 1);
        assert_eq!(snap.stats.included, 2);

        let excluded = leaf_hash(&[3; 32], &[0x01, 3], 9);
        assert_eq!(snap.index_of(&excluded), None);
    }

    #[test]
    fn collect_is_independent_of_scan_order() {
        let recs = vec![
            coin(4, 1, &[Some(1), Some(2)]),
            coin(9, 2, &[Some(3)]),
            coin(2, 3, &[Some(4)]),
        ];
        let mut reversed = recs.clone();
        reversed.reverse();
        let a = SnapshotCollector::new(&MemorySource::new(recs), SnapshotWindow::all())
            .collect()
            .unwrap();
        let b = SnapshotCollector::new(&MemorySource::new(reversed), SnapshotWindow::all())
            .collect()
            .unwrap();
        assert_eq!(a.leaves, b.leaves);
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn empty_snapshot_has_no_root_and_no_proofs() {
        let src = MemorySource::new(vec![coin(1, 5, &[Some(0)])]);
        let snap = SnapshotCollector::new(&src, SnapshotWindow::all())
            .collect()
            .unwrap();
        assert!(snap.is_empty());
        assert_eq!(snap.root(), SnapshotRoot::Empty);
        assert_eq!(snap.prove(0), None);
        assert_eq!(snap.prove_leaf(&[0u8; 32]), None);
    }

    #[test]
    fn is_unspent_checks_slot() {
        let src = MemorySource::new(vec![coin(1, 5, &[None, Some(3)])]);
        let op = |vout| Outpoint { txid: [1; 32], vout };
        assert!(!src.is_unspent(&op(0)).unwrap());
        assert!(src.is_unspent(&op(1)).unwrap());
        assert!(!src.is_unspent(&op(2)).unwrap());
        assert!(!src
            .is_unspent(&Outpoint {
                txid: [2; 32],
                vout: 0
            })
            .unwrap());
    }
}
