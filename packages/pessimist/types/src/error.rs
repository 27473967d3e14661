use thiserror::Error;

/// Errors produced by the shared types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Merkle proof does not describe a leaf of the tree
    #[error("leaf index {index} out of range for {leaf_count} leaves")]
    IndexOutOfRange {
        /// Index of the leaf
        index: u64,
        /// Size of the tree
        leaf_count: u64,
    },

    /// Audit path has the wrong number of siblings for its position
    #[error("malformed audit path: {reason}")]
    MalformedPath {
        /// Reason for error
        reason: String,
    },

    /// Store value is not a 32 byte commitment
    #[error("commitment must be 32 bytes, got {0}")]
    InvalidCommitmentLength(usize),

    /// Claim signature could not be recovered
    #[error("invalid claim signature: {0}")]
    Signature(String),

    /// Value could not be encoded
    #[error("encoding failed: {0}")]
    Encode(String),

    /// Bytes could not be decoded
    #[error("decoding failed: {0}")]
    Decode(String),
}

/// Classes of failure, deciding who reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Collection failed; logged and retried on the next polling cycle.
    Transient,
    /// An expected negative answer returned to the caller.
    Verification,
    /// Conflicting, forged or replayed data. Never retried.
    Integrity,
    /// The submitter or attestor is not allowed to act.
    Authorization,
    /// Bad settings or a lookup of something that was never configured.
    Configuration,
}
