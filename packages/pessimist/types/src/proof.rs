//! Direct inclusion proofs produced by the proof collector.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::{
    merkle::{root_from_audit_path, CommitmentTree},
    PacketCommitment, TypesError,
};

/// Inclusion proof of one packet commitment in a commitment root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipProof {
    /// Source chain height the proof was collected at
    pub height: u64,
    /// The proven packet commitment
    pub leaf: PacketCommitment,
    /// Position of the leaf in the sorted tree
    pub leaf_index: u64,
    /// Number of leaves in the tree
    pub leaf_count: u64,
    /// Audit path, deepest sibling first
    pub siblings: Vec<B256>,
}

impl MembershipProof {
    /// Root the proof commits to.
    ///
    /// # Errors
    /// Fails if the audit path is malformed.
    pub fn root(&self) -> Result<B256, TypesError> {
        root_from_audit_path(
            self.leaf.leaf_hash(),
            self.leaf_index,
            self.leaf_count,
            &self.siblings,
        )
    }

    /// Whether the proof folds to `expected`.
    #[must_use]
    pub fn proves(&self, expected: &B256) -> bool {
        self.root().is_ok_and(|root| &root == expected)
    }
}

/// All proofs collected in a single prover cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// Source chain
    pub chain_id: String,
    /// Height the commitments were read at
    pub height: u64,
    /// Root over all commitments at `height`
    pub commitment_root: B256,
    /// One proof per commitment, in tree order
    pub proofs: Vec<MembershipProof>,
}

impl ProofBundle {
    /// Build proofs for every commitment of `tree`.
    #[must_use]
    pub fn from_tree(chain_id: impl Into<String>, height: u64, tree: &CommitmentTree) -> Self {
        let leaf_count = tree.len() as u64;
        let proofs = tree
            .leaves()
            .iter()
            .enumerate()
            .filter_map(|(index, leaf)| {
                tree.audit_path(index).map(|siblings| MembershipProof {
                    height,
                    leaf: *leaf,
                    leaf_index: index as u64,
                    leaf_count,
                    siblings,
                })
            })
            .collect();

        Self {
            chain_id: chain_id.into(),
            height,
            commitment_root: tree.root(),
            proofs,
        }
    }

    /// Proof for the packet stored under `path`.
    #[must_use]
    pub fn proof_for(&self, path: &B256) -> Option<&MembershipProof> {
        self.proofs.iter().find(|proof| &proof.leaf.path == path)
    }
}
