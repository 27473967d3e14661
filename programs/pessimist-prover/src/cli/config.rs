//! Defines the top level configuration for the prover.
use std::{collections::BTreeSet, fs, path::Path, str::FromStr};

use anyhow::ensure;
use pessimist_chain_observer::cosmos::CosmosSourceConfig;
use thiserror::Error;
use tracing::Level;

const MIN_POLL_INTERVAL_MS: u64 = 100;
const MIN_TIMEOUT_MS: u64 = 100;

const fn default_poll_interval_ms() -> u64 {
    5_000
}

const fn default_timeout_ms() -> u64 {
    3_000
}

/// The top level configuration for the prover.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ProverConfig {
    pub server: ServerConfig,
    pub chains: Vec<ChainConfig>,
}

impl ProverConfig {
    /// Load and validate a `ProverConfig` from a TOML file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::Io(path_ref.display().to_string(), e))?;
        let cfg: Self = toml::from_str(&contents)?;
        cfg.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.chains.is_empty(), "at least one chain must be configured");
        let mut seen = BTreeSet::new();
        for chain in &self.chains {
            let chain_id = &chain.source.chain_id;
            ensure!(
                seen.insert(chain_id.as_str()),
                "chain `{chain_id}` is configured twice"
            );
            ensure!(
                chain.poll_interval_ms >= MIN_POLL_INTERVAL_MS,
                "chain `{chain_id}` poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}"
            );
            ensure!(
                chain.timeout_ms >= MIN_TIMEOUT_MS,
                "chain `{chain_id}` timeout_ms must be at least {MIN_TIMEOUT_MS}"
            );
        }
        Ok(())
    }
}

/// One chain to collect proofs from.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ChainConfig {
    #[serde(flatten)]
    pub source: CosmosSourceConfig,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// The configuration for the prover server.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub log_level: String,
}

impl ServerConfig {
    /// Returns the log level for the server.
    #[must_use]
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

/// Errors that can occur loading the prover config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading `{0}`: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("invalid TOML in config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
