#![doc = "secp256k1 signing and address recovery for pessimistic attestors"]
#![warn(clippy::nursery, clippy::pedantic, missing_docs)]

mod error;

pub mod recover;

#[cfg(feature = "signer")]
pub mod signature;

#[cfg(feature = "signer-local")]
pub mod keystore;

pub use error::KeyError;

/// Length of a recoverable `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// SHA-256 prehash that every attestor signature is computed over.
#[must_use]
pub fn prehash(message: &[u8]) -> alloy_primitives::B256 {
    use sha2::Digest;
    alloy_primitives::B256::from_slice(&sha2::Sha256::digest(message))
}
