//! Packet commitments as stored on the source chain.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::TypesError;

/// Domain separator for leaf hashes.
pub const LEAF_PREFIX: u8 = 0x00;

/// A single packet commitment together with the store path it lives under.
///
/// The path is part of the leaf so an attested commitment cannot be replayed
/// under a different packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PacketCommitment {
    /// `sha256` of the store key
    pub path: B256,
    /// The commitment value stored at that key
    pub commitment: B256,
}

impl PacketCommitment {
    /// Build a commitment from a raw store key and value.
    ///
    /// # Errors
    /// Fails if `value` is not 32 bytes long.
    pub fn from_store_entry(key: &[u8], value: &[u8]) -> Result<Self, TypesError> {
        if value.len() != 32 {
            return Err(TypesError::InvalidCommitmentLength(value.len()));
        }
        Ok(Self {
            path: B256::from_slice(&Sha256::digest(key)),
            commitment: B256::from_slice(value),
        })
    }

    /// `sha256(0x00 || path || commitment)`
    #[must_use]
    pub fn leaf_hash(&self) -> B256 {
        let mut hasher = Sha256::new();
        hasher.update([LEAF_PREFIX]);
        hasher.update(self.path);
        hasher.update(self.commitment);
        B256::from_slice(&hasher.finalize())
    }
}
