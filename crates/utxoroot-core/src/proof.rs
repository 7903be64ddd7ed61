//! Inclusion proofs over the fold in `merkle`.

use crate::hash::hash_pair;
use crate::merkle::{fold_level, HashList, SnapshotRoot};
use crate::types::Hash32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: Hash32,
    /// The sibling occupies the left slot; the running hash goes on the right.
    pub sibling_is_left: bool,
}

pub type ProofPath = Vec<ProofStep>;

/// Sibling path from leaf `index` up to just below the root, leaf level first.
///
/// Returns `None` if the list is empty or `index` is out of range. A single
/// leaf is its own root and gets an empty path.
pub fn prove(leaves: &HashList, index: usize) -> Option<ProofPath> {
    if index >= leaves.len() {
        return None;
    }

    let mut level = leaves.to_vec();
    let mut idx = index;
    let mut path = ProofPath::new();

    while level.len() > 1 {
        let sibling_idx = if idx % 2 == 0 {
            if idx + 1 < level.len() {
                idx + 1
            } else {
                idx
            }
        } else {
            idx - 1
        };
        path.push(ProofStep {
            sibling: level[sibling_idx],
            sibling_is_left: idx % 2 == 1,
        });

        fold_level(&mut level);
        // Tied to the ceil(n/2) fold: our parent sits at idx/2 on the next level.
        idx >>= 1;
    }

    Some(path)
}

/// Recompute the root implied by `leaf` and `path`.
pub fn verify_root(leaf: &Hash32, path: &[ProofStep]) -> Hash32 {
    path.iter().fold(*leaf, |current, step| {
        if step.sibling_is_left {
            hash_pair(&step.sibling, &current)
        } else {
            hash_pair(&current, &step.sibling)
        }
    })
}

/// True iff `path` proves `leaf` under the published `root`. Nothing is
/// included in an empty snapshot.
pub fn verify_inclusion(leaf: &Hash32, path: &[ProofStep], root: &SnapshotRoot) -> bool {
    match root {
        SnapshotRoot::Empty => false,
        SnapshotRoot::Root(r) => verify_root(leaf, path) == *r,
    }
}
