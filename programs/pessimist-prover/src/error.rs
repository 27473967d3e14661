use pessimist_chain_observer::ObserverError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProverError {
    #[error(transparent)]
    Observer(#[from] ObserverError),
    #[error("failed to encode proofs: {0}")]
    Encoding(String),
    #[error("chain `{0}` is not configured")]
    UnknownChain(String),
    #[error("invalid packet path `{0}`")]
    InvalidPath(String),
    #[error("failed to start prover server due to: {0}")]
    ServerConfig(String),
}
