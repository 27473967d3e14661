//! Signing over a SHA-256 prehash.

use alloy_signer::SignerSync;

use crate::{prehash, KeyError, SIGNATURE_LEN};

/// Sign `sha256(message)` and return the 65 byte `r || s || v` encoding.
///
/// ECDSA nonces are derived per RFC 6979, so equal inputs give equal output.
///
/// # Errors
/// Returns [`KeyError::Signing`] if the signer fails.
pub fn sign<T: SignerSync>(signer: &T, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], KeyError> {
    let sig = signer.sign_hash_sync(&prehash(message))?;
    Ok(sig.as_bytes())
}

#[cfg(test)]
mod sign {
    use crate::recover::recover_address;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn is_deterministic_and_recoverable() {
        let signer = PrivateKeySigner::from_slice(&[0x03; 32]).unwrap();

        let first = super::sign(&signer, b"hello").unwrap();
        let second = super::sign(&signer, b"hello").unwrap();
        assert_eq!(first, second);

        let v = first[64];
        assert!(v == 27 || v == 28);
        assert_eq!(recover_address(b"hello", &first).unwrap(), signer.address());
    }

    #[test]
    fn differs_per_message() {
        let signer = PrivateKeySigner::from_slice(&[0x03; 32]).unwrap();
        assert_ne!(
            super::sign(&signer, b"a").unwrap(),
            super::sign(&signer, b"b").unwrap()
        );
    }
}
