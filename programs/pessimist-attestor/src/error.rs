use pessimist_chain_observer::ObserverError;
use pessimist_types::ErrorCategory;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signing unavailable: {0}")]
    SigningUnavailable(String),
    #[error("snapshot could not be encoded: {0}")]
    Encoding(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttestorError {
    #[error(transparent)]
    Observer(#[from] ObserverError),
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error("chain `{chain_id}` reported root {observed} at height {height}, previously {signed}")]
    ConsistencyViolation {
        chain_id: String,
        height: u64,
        signed: String,
        observed: String,
    },
    #[error("chain `{0}` is halted after a consistency violation")]
    Halted(String),
    #[error("chain `{0}` is not configured")]
    UnknownChain(String),
    #[error("failed to start attestor server due to: {0}")]
    ServerConfig(String),
}

impl AttestorError {
    /// Observer and signer failures are retried on the next tick.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Observer(_) | Self::Signer(_) => ErrorCategory::Transient,
            Self::ConsistencyViolation { .. } | Self::Halted(_) => ErrorCategory::Integrity,
            Self::UnknownChain(_) | Self::ServerConfig(_) => ErrorCategory::Configuration,
        }
    }
}

#[cfg(test)]
mod category {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SignerError::SigningUnavailable("locked".into()).into(), ErrorCategory::Transient)]
    #[case(AttestorError::Halted("chain-a".into()), ErrorCategory::Integrity)]
    #[case(AttestorError::UnknownChain("chain-z".into()), ErrorCategory::Configuration)]
    #[case(AttestorError::ServerConfig("bad address".into()), ErrorCategory::Configuration)]
    fn classifies(#[case] err: AttestorError, #[case] expected: ErrorCategory) {
        assert_eq!(err.category(), expected);
    }
}
