use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use pessimist_keys::{keystore::read_keystore, signature::sign};
use pessimist_types::{AttestorId, PacketCommitmentSnapshot, SignedPacketCommitmentsClaim};

use crate::{cli::SignerConfig, SignerError};

/// Turns snapshots into claims signed with the attestor's `secp256k1` key.
///
/// Signatures use RFC 6979 nonces, so equal snapshots give equal claims.
pub struct Signer {
    signer: PrivateKeySigner,
    attestor_id: AttestorId,
}

impl Signer {
    /// Decrypt the configured keystore once at start-up.
    pub fn from_config(config: &SignerConfig) -> Result<Self, SignerError> {
        let signer = read_keystore(&config.keystore_path, &config.keystore_password)
            .map_err(|e| SignerError::SigningUnavailable(e.to_string()))?;
        Ok(Self::new(signer, config.attestor_id.clone()))
    }

    pub fn new(signer: PrivateKeySigner, attestor_id: impl Into<AttestorId>) -> Self {
        Self {
            signer,
            attestor_id: attestor_id.into(),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub const fn attestor_id(&self) -> &AttestorId {
        &self.attestor_id
    }

    pub fn sign(
        &self,
        snapshot: &PacketCommitmentSnapshot,
    ) -> Result<SignedPacketCommitmentsClaim, SignerError> {
        let bytes = snapshot
            .signable_bytes()
            .map_err(|e| SignerError::Encoding(e.to_string()))?;
        let signature = sign(&self.signer, &bytes)
            .map_err(|e| SignerError::SigningUnavailable(e.to_string()))?;

        Ok(SignedPacketCommitmentsClaim {
            snapshot: snapshot.clone(),
            attestor_id: self.attestor_id.clone(),
            signature: signature.to_vec(),
        })
    }
}

/// Whether `claim` was signed by `address` over its own snapshot.
#[must_use]
pub fn verify_claim_signature(claim: &SignedPacketCommitmentsClaim, address: Address) -> bool {
    claim.is_signed_by(address)
}


#[cfg(test)]
mod from_config {
    use super::*;
    use pessimist_keys::keystore::write_keystore;
    use tempfile::tempdir;

    #[test]
    fn loads_keystore() {
        let dir = tempdir().unwrap();
        let key = PrivateKeySigner::random();
        let path = write_keystore(dir.path(), "attestor", "", &key).unwrap();

        let signer = Signer::from_config(&SignerConfig {
            keystore_path: path,
            keystore_password: String::new(),
            attestor_id: "A".into(),
        })
        .unwrap();

        assert_eq!(signer.address(), key.address());
    }

    #[test]
    fn missing_keystore_is_signing_unavailable() {
        let dir = tempdir().unwrap();
        let res = Signer::from_config(&SignerConfig {
            keystore_path: dir.path().join("missing"),
            keystore_password: String::new(),
            attestor_id: "A".into(),
        });

        assert!(matches!(res, Err(SignerError::SigningUnavailable(_))));
    }
}
