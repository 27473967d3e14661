//! Signed attestor claims.

use std::fmt;

use alloy_primitives::Address;
use pessimist_keys::recover::recover_address;
use serde::{Deserialize, Serialize};

use crate::{PacketCommitmentSnapshot, TypesError};

/// Identifier an attestor is registered under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestorId(pub String);

impl AttestorId {
    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttestorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AttestorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A snapshot signed by one attestor.
///
/// The signature is a 65 byte `r || s || v` secp256k1 signature over
/// `sha256(snapshot.signable_bytes())`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedPacketCommitmentsClaim {
    /// Observed state
    pub snapshot: PacketCommitmentSnapshot,
    /// Attestor that produced the signature
    pub attestor_id: AttestorId,
    /// Signature over the snapshot
    pub signature: Vec<u8>,
}

impl SignedPacketCommitmentsClaim {
    /// Address that produced the signature.
    ///
    /// # Errors
    /// Fails if the snapshot cannot be encoded or the signature is malformed.
    pub fn recover_signer(&self) -> Result<Address, TypesError> {
        let message = self.snapshot.signable_bytes()?;
        recover_address(&message, &self.signature).map_err(|e| TypesError::Signature(e.to_string()))
    }

    /// Whether the claim was signed by `address`.
    #[must_use]
    pub fn is_signed_by(&self, address: Address) -> bool {
        self.recover_signer().is_ok_and(|signer| signer == address)
    }

    /// Source chain the claim is about.
    #[must_use]
    pub fn chain_id(&self) -> &str {
        &self.snapshot.chain_id
    }

    /// Source chain height the claim is about.
    #[must_use]
    pub const fn height(&self) -> u64 {
        self.snapshot.height
    }
}
