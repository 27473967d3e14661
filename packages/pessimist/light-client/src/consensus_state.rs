//! Trusted consensus state per height

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Root trusted at one height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    /// Source chain height
    pub height: u64,
    /// Packet-commitment root attested at `height`
    pub commitment_root: B256,
    /// Source block time of `height`, unix seconds
    pub timestamp: u64,
}
