//! Address recovery from 65 byte signatures.

use alloy_primitives::{Address, Signature, B256};

use crate::{prehash, KeyError, SIGNATURE_LEN};

/// Recover the signing address of `signature` over `sha256(message)`.
///
/// # Errors
/// Returns [`KeyError::MalformedSignature`] when the signature is not 65 bytes
/// and [`KeyError::Recovery`] when no public key can be recovered.
pub fn recover_address(message: &[u8], signature: &[u8]) -> Result<Address, KeyError> {
    recover_address_from_prehash(&prehash(message), signature)
}

/// Recover the signing address of `signature` over an already hashed message.
///
/// # Errors
/// See [`recover_address`].
pub fn recover_address_from_prehash(
    prehash: &B256,
    signature: &[u8],
) -> Result<Address, KeyError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(KeyError::MalformedSignature {
            expected: SIGNATURE_LEN,
            got: signature.len(),
        });
    }
    let sig = Signature::try_from(signature).map_err(KeyError::Recovery)?;
    sig.recover_address_from_prehash(prehash)
        .map_err(KeyError::Recovery)
}

/// Returns true if `signature` over `message` was produced by `expected`.
#[must_use]
pub fn verify_signature(expected: Address, message: &[u8], signature: &[u8]) -> bool {
    recover_address(message, signature).is_ok_and(|addr| addr == expected)
}

#[cfg(test)]
mod recover_address {
    use super::*;
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn matches_signer_address() {
        let signer = PrivateKeySigner::from_slice(&[0xcd; 32]).unwrap();
        let msg = b"snapshot";
        let sig = signer.sign_hash_sync(&prehash(msg)).unwrap();

        let addr = super::recover_address(msg, &sig.as_bytes()).unwrap();
        assert_eq!(addr, signer.address());
    }

    #[test]
    fn fails_on_short_signature() {
        let res = super::recover_address(b"abc", &[0u8; 64]);
        assert!(matches!(
            res,
            Err(KeyError::MalformedSignature { expected: 65, got: 64 })
        ));
    }
}
