//! Cosmos SDK chains read over CometBFT RPC.

use pessimist_types::PacketCommitment;
use prost::Message;
use tendermint::block::Height;
use tendermint_rpc::{Client, HttpClient};

use crate::{CommitmentSource, ObserverError};

pub use config::CosmosSourceConfig;

mod config;

/// `cosmos.base.kv.v1beta1.Pair`
#[derive(Clone, PartialEq, Message)]
pub struct Pair {
    /// Full store key
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
    /// Stored value
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// `cosmos.base.kv.v1beta1.Pairs`, the payload of a subspace query.
#[derive(Clone, PartialEq, Message)]
pub struct Pairs {
    /// All key/value pairs under the queried prefix
    #[prost(message, repeated, tag = "1")]
    pub pairs: Vec<Pair>,
}

/// Reads packet commitments from a Cosmos SDK store with a subspace query.
#[derive(Debug)]
pub struct CosmosSource {
    chain_id: String,
    rpc: HttpClient,
    store_prefix: String,
    commitment_prefix: Vec<u8>,
}

impl CosmosSource {
    /// Build a source from its configuration.
    ///
    /// # Errors
    /// Fails if the RPC url is invalid.
    pub fn from_config(config: &CosmosSourceConfig) -> Result<Self, ObserverError> {
        let rpc = HttpClient::new(config.rpc_url.as_str())
            .map_err(|e| ObserverError::unreachable(&config.chain_id, e))?;
        Ok(Self {
            chain_id: config.chain_id.clone(),
            rpc,
            store_prefix: config.store_prefix.clone(),
            commitment_prefix: config.commitment_prefix.as_bytes().to_vec(),
        })
    }

    fn height(&self, height: u64) -> Result<Height, ObserverError> {
        Height::try_from(height).map_err(|e| ObserverError::unreachable(&self.chain_id, e))
    }

    async fn earliest_height(&self) -> Result<u64, ObserverError> {
        let status = self
            .rpc
            .status()
            .await
            .map_err(|e| ObserverError::unreachable(&self.chain_id, e))?;
        Ok(status.sync_info.earliest_block_height.value())
    }
}

/// Decode a subspace query response into packet commitments.
///
/// # Errors
/// Fails if the payload is not `Pairs` or a value is not 32 bytes.
pub fn decode_commitments(payload: &[u8]) -> Result<Vec<PacketCommitment>, ObserverError> {
    let pairs = Pairs::decode(payload).map_err(|e| ObserverError::InvalidCommitment {
        reason: e.to_string(),
    })?;

    pairs
        .pairs
        .iter()
        .map(|pair| {
            PacketCommitment::from_store_entry(&pair.key, &pair.value).map_err(|e| {
                ObserverError::InvalidCommitment {
                    reason: format!("key {}: {e}", String::from_utf8_lossy(&pair.key)),
                }
            })
        })
        .collect()
}

impl CommitmentSource for CosmosSource {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn latest_height(&self) -> Result<u64, ObserverError> {
        let status = self
            .rpc
            .status()
            .await
            .map_err(|e| ObserverError::unreachable(&self.chain_id, e))?;
        Ok(status.sync_info.latest_block_height.value())
    }

    async fn packet_commitments(&self, height: u64) -> Result<Vec<PacketCommitment>, ObserverError> {
        let earliest = self.earliest_height().await?;
        if height < earliest {
            return Err(ObserverError::StaleHeight {
                requested: height,
                earliest,
            });
        }

        let res = self
            .rpc
            .abci_query(
                Some(format!("store/{}/subspace", self.store_prefix)),
                self.commitment_prefix.clone(),
                Some(self.height(height)?),
                false,
            )
            .await
            .map_err(|e| ObserverError::unreachable(&self.chain_id, e))?;

        if res.code.is_err() {
            return Err(ObserverError::unreachable(
                &self.chain_id,
                format!("abci query failed: {}", res.log),
            ));
        }

        let commitments = decode_commitments(&res.value)?;
        tracing::debug!(
            chain_id = %self.chain_id,
            height,
            "read {} packet commitments",
            commitments.len()
        );
        Ok(commitments)
    }

    async fn block_timestamp(&self, height: u64) -> Result<u64, ObserverError> {
        let commit = self
            .rpc
            .commit(self.height(height)?)
            .await
            .map_err(|e| ObserverError::unreachable(&self.chain_id, e))?;

        u64::try_from(commit.signed_header.header.time.unix_timestamp()).map_err(|_| {
            ObserverError::InvalidCommitment {
                reason: "block time before unix epoch".into(),
            }
        })
    }
}


#[cfg(test)]
mod from_config {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        let config = CosmosSourceConfig {
            chain_id: "chain-a".into(),
            rpc_url: "not a url".into(),
            store_prefix: "ibc".into(),
            commitment_prefix: "commitments/".into(),
        };
        assert!(matches!(
            CosmosSource::from_config(&config),
            Err(ObserverError::UnreachableSource { .. })
        ));
    }
}
