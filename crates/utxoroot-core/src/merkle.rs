//! Pairwise fold of a sorted leaf list into a single root.
//!
//! Each level halves the list rounding up: node i = H(old[2i] || old[2i+1]),
//! and an unmatched tail element is paired with itself, not with zero.
//! `proof::prove` walks the same levels with `idx >> 1`, so any change to the
//! branching here must be mirrored there.

use std::ops::Deref;

use crate::hash::hash_pair;
use crate::types::Hash32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotRoot {
    /// No eligible outputs in the snapshot.
    Empty,
    Root(Hash32),
}

impl SnapshotRoot {
    pub fn root(&self) -> Option<Hash32> {
        match self {
            SnapshotRoot::Empty => None,
            SnapshotRoot::Root(r) => Some(*r),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SnapshotRoot::Empty)
    }

    /// Published form: the designated null value for an empty snapshot.
    pub fn to_bytes(&self) -> Hash32 {
        self.root().unwrap_or([0u8; 32])
    }
}

/// Leaf hashes in ascending byte order, duplicates kept.
///
/// Every constructor sorts, so a root or proof over a `HashList` is a
/// function of the leaf set alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HashList(Vec<Hash32>);

impl HashList {
    pub fn from_unsorted(mut leaves: Vec<Hash32>) -> Self {
        leaves.sort_unstable();
        Self(leaves)
    }

    pub fn as_slice(&self) -> &[Hash32] {
        &self.0
    }

    /// Position of `target` (first occurrence).
    pub fn index_of(&self, target: &Hash32) -> Option<usize> {
        let i = self.0.partition_point(|h| h < target);
        (i < self.0.len() && self.0[i] == *target).then_some(i)
    }
}

impl From<Vec<Hash32>> for HashList {
    fn from(leaves: Vec<Hash32>) -> Self {
        Self::from_unsorted(leaves)
    }
}

impl FromIterator<Hash32> for HashList {
    fn from_iter<I: IntoIterator<Item = Hash32>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

impl Deref for HashList {
    type Target = [Hash32];

    fn deref(&self) -> &[Hash32] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a HashList {
    type Item = &'a Hash32;
    type IntoIter = std::slice::Iter<'a, Hash32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Fold one level in place.
pub(crate) fn fold_level(level: &mut Vec<Hash32>) {
    let count = level.len();
    let half = count.div_ceil(2);
    for i in 0..half {
        let left = 2 * i;
        let right = if left + 1 < count { left + 1 } else { left };
        level[i] = hash_pair(&level[left], &level[right]);
    }
    level.truncate(half);
}

pub fn merkle_root(leaves: &HashList) -> SnapshotRoot {
    if leaves.is_empty() {
        return SnapshotRoot::Empty;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        fold_level(&mut level);
    }
    SnapshotRoot::Root(level[0])
}
