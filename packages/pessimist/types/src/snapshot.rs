//! Unsigned observations of a source chain.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::{merkle, PacketCommitment, TypesError};

/// The packet-commitment root of `chain_id` at `height`.
///
/// `collected_at` is the source block's unix time (seconds), not the
/// observer's wall clock, so independent attestors agree byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketCommitmentSnapshot {
    /// Source chain identifier
    pub chain_id: String,
    /// Source chain height the root was read at
    pub height: u64,
    /// Merkle root over the packet commitments at `height`
    pub commitment_root: B256,
    /// Block time of `height` in unix seconds
    pub collected_at: u64,
}

impl PacketCommitmentSnapshot {
    /// Snapshot whose root is computed from `commitments`.
    #[must_use]
    pub fn from_commitments(
        chain_id: impl Into<String>,
        height: u64,
        collected_at: u64,
        commitments: Vec<PacketCommitment>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            commitment_root: merkle::CommitmentTree::new(commitments).root(),
            collected_at,
        }
    }

    /// The exact bytes an attestor signs.
    ///
    /// Borsh encoding of `(chain_id, height, commitment_root, collected_at)`.
    ///
    /// # Errors
    /// Fails only if the chain id is longer than `u32::MAX` bytes.
    pub fn signable_bytes(&self) -> Result<Vec<u8>, TypesError> {
        borsh::to_vec(&(
            self.chain_id.as_str(),
            self.height,
            self.commitment_root.0,
            self.collected_at,
        ))
        .map_err(|e| TypesError::Encode(e.to_string()))
    }
}


#[cfg(test)]
mod from_commitments {
    use super::*;

    #[test]
    fn root_ignores_input_order() {
        let a = PacketCommitment {
            path: B256::repeat_byte(1),
            commitment: B256::repeat_byte(2),
        };
        let b = PacketCommitment {
            path: B256::repeat_byte(3),
            commitment: B256::repeat_byte(4),
        };

        let first = PacketCommitmentSnapshot::from_commitments("c", 1, 10, vec![a, b]);
        let second = PacketCommitmentSnapshot::from_commitments("c", 1, 10, vec![b, a]);
        assert_eq!(first, second);
    }
}
