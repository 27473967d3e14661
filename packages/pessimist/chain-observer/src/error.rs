use thiserror::Error;

/// Failures while reading a source chain.
///
/// All variants are transient from the attestor's point of view: they are
/// logged and the next polling cycle retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// The chain could not be queried, including timeouts.
    #[error("source chain `{chain_id}` unreachable: {reason}")]
    UnreachableSource {
        /// Chain that failed
        chain_id: String,
        /// Underlying failure
        reason: String,
    },

    /// The requested height has been pruned by the node.
    #[error("height {requested} no longer available, earliest retained is {earliest}")]
    StaleHeight {
        /// Height that was asked for
        requested: u64,
        /// Lowest height the node still serves
        earliest: u64,
    },

    /// The node returned data that is not a packet commitment.
    #[error("invalid commitment data: {reason}")]
    InvalidCommitment {
        /// Reason for error
        reason: String,
    },
}

impl ObserverError {
    pub(crate) fn unreachable(chain_id: &str, reason: impl ToString) -> Self {
        Self::UnreachableSource {
            chain_id: chain_id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Observer failures are always retried on the next cycle.
    #[must_use]
    pub const fn category(&self) -> pessimist_types::ErrorCategory {
        pessimist_types::ErrorCategory::Transient
    }
}
