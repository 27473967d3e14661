//! Binary Merkle tree over packet commitments.
//!
//! Layout follows RFC 6962: leaves are hashed with a `0x00` prefix, inner
//! nodes with `0x01`, and a level of `n` nodes splits at the largest power of
//! two below `n`. Leaves are sorted by path so every observer of the same
//! store contents derives the same root.

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

use crate::{PacketCommitment, TypesError};

/// Domain separator for inner nodes.
pub const NODE_PREFIX: u8 = 0x01;

/// Root of a tree without leaves: `sha256("")`.
#[must_use]
pub fn empty_root() -> B256 {
    B256::from_slice(&Sha256::digest(b""))
}

/// `sha256(0x01 || left || right)`
#[must_use]
pub fn node_hash(left: &B256, right: &B256) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    B256::from_slice(&hasher.finalize())
}

/// Tree over a canonically ordered set of packet commitments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentTree {
    leaves: Vec<PacketCommitment>,
    hashes: Vec<B256>,
}

impl CommitmentTree {
    /// Sorts and deduplicates `commitments` before building the tree.
    #[must_use]
    pub fn new(mut commitments: Vec<PacketCommitment>) -> Self {
        commitments.sort_unstable();
        commitments.dedup();
        let hashes = commitments.iter().map(PacketCommitment::leaf_hash).collect();
        Self {
            leaves: commitments,
            hashes,
        }
    }

    /// Merkle root of the tree.
    #[must_use]
    pub fn root(&self) -> B256 {
        subtree_root(&self.hashes)
    }

    /// Leaves in tree order.
    #[must_use]
    pub fn leaves(&self) -> &[PacketCommitment] {
        &self.leaves
    }

    /// Number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the tree has no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Position of the leaf stored under `path`.
    #[must_use]
    pub fn position(&self, path: &B256) -> Option<usize> {
        self.leaves.binary_search_by(|leaf| leaf.path.cmp(path)).ok()
    }

    /// Sibling hashes from the leaf at `index` up to the root, deepest first.
    #[must_use]
    pub fn audit_path(&self, index: usize) -> Option<Vec<B256>> {
        (index < self.hashes.len()).then(|| audit_path(index, &self.hashes))
    }
}

fn split_point(n: usize) -> usize {
    let mut k = 1;
    while k << 1 < n {
        k <<= 1;
    }
    k
}

fn subtree_root(hashes: &[B256]) -> B256 {
    match hashes {
        [] => empty_root(),
        [leaf] => *leaf,
        _ => {
            let k = split_point(hashes.len());
            node_hash(&subtree_root(&hashes[..k]), &subtree_root(&hashes[k..]))
        }
    }
}

fn audit_path(index: usize, hashes: &[B256]) -> Vec<B256> {
    if hashes.len() <= 1 {
        return Vec::new();
    }
    let k = split_point(hashes.len());
    if index < k {
        let mut path = audit_path(index, &hashes[..k]);
        path.push(subtree_root(&hashes[k..]));
        path
    } else {
        let mut path = audit_path(index - k, &hashes[k..]);
        path.push(subtree_root(&hashes[..k]));
        path
    }
}

/// Fold an audit path back into the root it commits to.
///
/// # Errors
/// Fails if `index` is outside the tree or the path length does not match
/// the leaf's position.
pub fn root_from_audit_path(
    leaf_hash: B256,
    index: u64,
    leaf_count: u64,
    path: &[B256],
) -> Result<B256, TypesError> {
    if index >= leaf_count {
        return Err(TypesError::IndexOutOfRange { index, leaf_count });
    }

    let mut fnode = index;
    let mut snode = leaf_count - 1;
    let mut root = leaf_hash;
    for sibling in path {
        if snode == 0 {
            return Err(TypesError::MalformedPath {
                reason: "path longer than tree depth".into(),
            });
        }
        if fnode & 1 == 1 || fnode == snode {
            root = node_hash(sibling, &root);
            while fnode & 1 == 0 && fnode != 0 {
                fnode >>= 1;
                snode >>= 1;
            }
        } else {
            root = node_hash(&root, sibling);
        }
        fnode >>= 1;
        snode >>= 1;
    }

    if snode != 0 {
        return Err(TypesError::MalformedPath {
            reason: "path shorter than tree depth".into(),
        });
    }
    Ok(root)
}

#[cfg(test)]
mod root {
    use super::*;

    fn packet(n: u8) -> PacketCommitment {
        PacketCommitment {
            path: B256::repeat_byte(n),
            commitment: B256::repeat_byte(n.wrapping_add(0x80)),
        }
    }

    #[test]
    fn empty_tree_hashes_empty_string() {
        let tree = CommitmentTree::new(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.root(), empty_root());
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let tree = CommitmentTree::new(vec![packet(1)]);
        assert_eq!(tree.root(), packet(1).leaf_hash());
    }

    #[test]
    fn three_leaves_split_left_heavy() {
        let tree = CommitmentTree::new(vec![packet(3), packet(1), packet(2)]);
        let expected = node_hash(
            &node_hash(&packet(1).leaf_hash(), &packet(2).leaf_hash()),
            &packet(3).leaf_hash(),
        );
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let with_dup = CommitmentTree::new(vec![packet(1), packet(2), packet(1)]);
        let without = CommitmentTree::new(vec![packet(1), packet(2)]);
        assert_eq!(with_dup.len(), 2);
        assert_eq!(with_dup.root(), without.root());
    }
}
