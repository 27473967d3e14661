//! Defines the top level configuration for the attestor.
use std::{
    collections::BTreeSet,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::ensure;
use pessimist_chain_observer::cosmos::CosmosSourceConfig;
use thiserror::Error;
use tracing::Level;

/// Keystore file name used when none is configured.
pub const DEFAULT_KEYSTORE_NAME: &str = "attestor.json";

/// `~/.pessimist-attestor`
pub fn attestor_dir() -> anyhow::Result<PathBuf> {
    env::home_dir()
        .map(|home| home.join(".pessimist-attestor"))
        .ok_or_else(|| anyhow::anyhow!("no home directory to keep the keystore in"))
}

pub mod defaults {
    pub const POLL_INTERVAL_MS: u64 = 5_000;
    pub const TIMEOUT_MS: u64 = 3_000;
    pub const HISTORY_SIZE: usize = 100;

    pub const MIN_POLL_INTERVAL_MS: u64 = 100;
    pub const MAX_POLL_INTERVAL_MS: u64 = 600_000;
    pub const MIN_TIMEOUT_MS: u64 = 100;
    pub const MAX_TIMEOUT_MS: u64 = 60_000;

    pub(super) const fn poll_interval_ms() -> u64 {
        POLL_INTERVAL_MS
    }

    pub(super) const fn timeout_ms() -> u64 {
        TIMEOUT_MS
    }

    pub(super) const fn history_size() -> usize {
        HISTORY_SIZE
    }
}

/// The top level configuration for the attestor.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AttestorConfig {
    /// The configuration for the attestor server.
    pub server: ServerConfig,
    /// The configuration for the attestor signer.
    pub signer: SignerConfig,
    /// The chains to attest, one `[[chains]]` table each.
    pub chains: Vec<ChainConfig>,
}

impl AttestorConfig {
    /// Load and validate an `AttestorConfig` from a TOML file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::Io(path_ref.display().to_string(), e))?;
        let cfg: Self = toml::from_str(&contents)?;
        cfg.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(cfg)
    }

    /// Check required fields, unique chain ids and interval bounds.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.signer.attestor_id.is_empty(),
            "signer.attestor_id must be set"
        );
        ensure!(
            !self.signer.keystore_path.as_os_str().is_empty(),
            "signer.keystore_path must be set"
        );
        ensure!(!self.chains.is_empty(), "at least one chain must be configured");

        let mut seen = BTreeSet::new();
        for chain in &self.chains {
            chain.validate()?;
            ensure!(
                seen.insert(chain.source.chain_id.as_str()),
                "chain `{}` is configured twice",
                chain.source.chain_id
            );
        }
        Ok(())
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct SignerConfig {
    pub keystore_path: PathBuf,
    #[serde(default)]
    pub keystore_password: String,
    pub attestor_id: String,
}

/// One observed chain.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ChainConfig {
    #[serde(flatten)]
    pub source: CosmosSourceConfig,
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,
    /// Number of signed claims retained for per-height lookups.
    #[serde(default = "defaults::history_size")]
    pub history_size: usize,
}

impl ChainConfig {
    fn validate(&self) -> anyhow::Result<()> {
        let chain_id = &self.source.chain_id;
        ensure!(!chain_id.is_empty(), "chain_id must be set");
        ensure!(
            !self.source.rpc_url.is_empty(),
            "chain `{chain_id}` has no rpc_url"
        );
        ensure!(
            (defaults::MIN_POLL_INTERVAL_MS..=defaults::MAX_POLL_INTERVAL_MS)
                .contains(&self.poll_interval_ms),
            "chain `{chain_id}` poll_interval_ms must be within {}..={}",
            defaults::MIN_POLL_INTERVAL_MS,
            defaults::MAX_POLL_INTERVAL_MS
        );
        ensure!(
            (defaults::MIN_TIMEOUT_MS..=defaults::MAX_TIMEOUT_MS).contains(&self.timeout_ms),
            "chain `{chain_id}` timeout_ms must be within {}..={}",
            defaults::MIN_TIMEOUT_MS,
            defaults::MAX_TIMEOUT_MS
        );
        ensure!(
            self.history_size > 0,
            "chain `{chain_id}` history_size must be positive"
        );
        Ok(())
    }
}

/// The configuration for the attestor server.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ServerConfig {
    /// The address to bind the server to.
    pub address: String,
    /// The port to bind the server to.
    pub port: u16,
    /// The log level for the server.
    #[serde(default)]
    pub log_level: String,
    /// Port of a standalone metrics endpoint, if any.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl ServerConfig {
    /// Returns the log level for the server.
    #[must_use]
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

/// Errors that can occur loading the attestor config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading `{0}`: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("invalid TOML in config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
