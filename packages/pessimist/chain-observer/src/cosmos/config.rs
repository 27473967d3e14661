use serde::Deserialize;

/// Connection settings for a Cosmos SDK source chain.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CosmosSourceConfig {
    /// Chain identifier claims are issued for
    pub chain_id: String,
    /// CometBFT RPC endpoint
    pub rpc_url: String,
    /// Store the commitments live in
    #[serde(default = "CosmosSourceConfig::default_store_prefix")]
    pub store_prefix: String,
    /// Key prefix of packet commitments inside the store
    #[serde(default = "CosmosSourceConfig::default_commitment_prefix")]
    pub commitment_prefix: String,
}

impl CosmosSourceConfig {
    fn default_store_prefix() -> String {
        "ibc".to_string()
    }

    fn default_commitment_prefix() -> String {
        "commitments/".to_string()
    }
}
