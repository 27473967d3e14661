use thiserror::Error;

/// Errors raised while signing, recovering or loading attestor keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Signature bytes could not be parsed into `r || s || v`.
    #[error("malformed signature: expected {expected} bytes, got {got}")]
    MalformedSignature {
        /// Required length
        expected: usize,
        /// Length received
        got: usize,
    },

    /// Public key recovery failed.
    #[error("signature recovery failed: {0}")]
    Recovery(#[source] alloy_primitives::SignatureError),

    /// The underlying signer refused to sign.
    #[cfg(feature = "signer")]
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),

    /// The keystore could not be read or written.
    #[cfg(feature = "signer-local")]
    #[error("keystore error: {0}")]
    Keystore(#[from] alloy_signer_local::LocalSignerError),
}
