//! Error types for the pessimistic light client

use pessimist_types::{ErrorCategory, TypesError};
use thiserror::Error;

/// Main error type for pessimistic client operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PessimistClientError {
    /// Empty claim batch
    #[error("no claims submitted")]
    NoClaims,

    /// No group of claims reached the quorum threshold
    #[error("quorum not met: best group weight {best_weight}, threshold {threshold}")]
    QuorumNotMet {
        /// Weight of the heaviest group
        best_weight: u64,
        /// Required weight
        threshold: u64,
    },

    /// Two different roots reached quorum at the same height, or a root
    /// reached quorum where a member signed more than one root
    #[error("conflicting quorum at height {height}")]
    ConflictingQuorum {
        /// Height of the conflict
        height: u64,
    },

    /// Every claim came from an attestor outside the set
    #[error("claims from attestors outside the attestor set")]
    UnauthorizedAttestors,

    /// Every valid claim was at or below the trusted height
    #[error("claims are not newer than trusted height {latest_trusted_height}")]
    StaleClaims {
        /// Current trusted height
        latest_trusted_height: u64,
    },

    /// Every claim failed signature verification
    #[error("claim signature verification failed")]
    InvalidSignatures,

    /// Claims are about a different chain than the client tracks
    #[error("claims for chain `{got}`, client tracks `{expected}`")]
    ChainMismatch {
        /// Tracked chain
        expected: String,
        /// Chain the claims named
        got: String,
    },

    /// Client is frozen
    #[error("client frozen at height {height}")]
    ClientFrozen {
        /// Height the conflict was detected at
        height: u64,
    },

    /// Queried height is above the latest trusted height
    #[error("height {height} not yet trusted, latest is {latest_trusted_height}")]
    HeightNotYetTrusted {
        /// Queried height
        height: u64,
        /// Current trusted height
        latest_trusted_height: u64,
    },

    /// No root retained for the queried height
    #[error("no trusted root retained for height {height}")]
    UnknownRoot {
        /// Queried height
        height: u64,
    },

    /// Queried root differs from the trusted one
    #[error("root does not match trusted root at height {height}")]
    RootMismatch {
        /// Queried height
        height: u64,
    },

    /// Bad proof provided
    #[error("proof invalid: {reason}")]
    InvalidProof {
        /// Reason for error
        reason: String,
    },

    /// Attestor set failed validation
    #[error("invalid attestor set: {reason}")]
    InvalidAttestorSet {
        /// Reason for error
        reason: String,
    },

    /// Quorum policy failed validation
    #[error("invalid quorum policy: {reason}")]
    InvalidQuorumPolicy {
        /// Reason for error
        reason: String,
    },

    /// Initial client or consensus state is inconsistent
    #[error("invalid client state: {reason}")]
    InvalidClientState {
        /// Reason for error
        reason: String,
    },

    /// Caller is not allowed to perform the action
    #[error("unauthorized: `{sender}` may not {action}")]
    Unauthorized {
        /// Caller
        sender: String,
        /// Attempted action
        action: String,
    },

    /// No client stored under the id
    #[error("client `{0}` not found")]
    ClientNotFound(String),

    /// Client id already taken
    #[error("client `{0}` already exists")]
    ClientAlreadyExists(String),

    /// Recovery attempted on an active client
    #[error("client `{0}` is not frozen")]
    ClientNotFrozen(String),

    /// Message or stored state could not be decoded
    #[error("codec error: {0}")]
    Codec(#[from] TypesError),
}

impl PessimistClientError {
    /// Which part of the error taxonomy this belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConflictingQuorum { .. }
            | Self::StaleClaims { .. }
            | Self::InvalidSignatures
            | Self::ChainMismatch { .. }
            | Self::ClientFrozen { .. } => ErrorCategory::Integrity,
            Self::UnauthorizedAttestors | Self::Unauthorized { .. } => {
                ErrorCategory::Authorization
            }
            _ => ErrorCategory::Verification,
        }
    }

    /// Whether resubmitting later, with more claims, can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::QuorumNotMet { .. } | Self::NoClaims)
    }
}

#[cfg(test)]
mod category {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PessimistClientError::QuorumNotMet { best_weight: 1, threshold: 2 }, ErrorCategory::Verification)]
    #[case(PessimistClientError::HeightNotYetTrusted { height: 5, latest_trusted_height: 4 }, ErrorCategory::Verification)]
    #[case(PessimistClientError::UnknownRoot { height: 1 }, ErrorCategory::Verification)]
    #[case(PessimistClientError::ConflictingQuorum { height: 1 }, ErrorCategory::Integrity)]
    #[case(PessimistClientError::StaleClaims { latest_trusted_height: 1 }, ErrorCategory::Integrity)]
    #[case(PessimistClientError::InvalidSignatures, ErrorCategory::Integrity)]
    #[case(PessimistClientError::UnauthorizedAttestors, ErrorCategory::Authorization)]
    #[case(PessimistClientError::Unauthorized { sender: "x".into(), action: "update".into() }, ErrorCategory::Authorization)]
    fn maps_taxonomy(#[case] err: PessimistClientError, #[case] expected: ErrorCategory) {
        assert_eq!(err.category(), expected);
    }

    #[test]
    fn only_quorum_shortfall_is_retryable() {
        assert!(PessimistClientError::QuorumNotMet {
            best_weight: 0,
            threshold: 1
        }
        .is_retryable());
        assert!(!PessimistClientError::ConflictingQuorum { height: 1 }.is_retryable());
        assert!(!PessimistClientError::ClientFrozen { height: 1 }.is_retryable());
    }
}
