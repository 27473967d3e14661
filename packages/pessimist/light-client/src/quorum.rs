//! Quorum policies over an attestor set.

use serde::{Deserialize, Serialize};

use crate::{
    attestor_set::{AttestorInfo, AttestorSet},
    error::PessimistClientError,
};

/// Weight a group of claims must reach to be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumPolicy {
    /// Every attestor counts once.
    Count {
        /// Minimum number of distinct attestors
        threshold: u64,
    },
    /// Every attestor counts with its registered weight.
    Weighted {
        /// Minimum summed weight
        threshold: u64,
    },
}

impl QuorumPolicy {
    /// The configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> u64 {
        match self {
            Self::Count { threshold } | Self::Weighted { threshold } => *threshold,
        }
    }

    /// Contribution of one attestor.
    #[must_use]
    pub const fn weight_of(&self, info: &AttestorInfo) -> u64 {
        match self {
            Self::Count { .. } => 1,
            Self::Weighted { .. } => info.weight,
        }
    }

    /// Weight of the whole set under this policy.
    #[must_use]
    pub fn total_weight(&self, set: &AttestorSet) -> u64 {
        match self {
            Self::Count { .. } => set.len() as u64,
            Self::Weighted { .. } => set.total_weight(),
        }
    }

    /// Whether `weight` reaches the threshold.
    #[must_use]
    pub const fn is_met(&self, weight: u64) -> bool {
        weight >= self.threshold()
    }

    /// Check `0 < threshold <= total weight`.
    ///
    /// # Errors
    /// Returns [`PessimistClientError::InvalidQuorumPolicy`] otherwise.
    pub fn validate(&self, set: &AttestorSet) -> Result<(), PessimistClientError> {
        let threshold = self.threshold();
        let total = self.total_weight(set);
        if threshold == 0 {
            return Err(PessimistClientError::InvalidQuorumPolicy {
                reason: "threshold must be positive".into(),
            });
        }
        if threshold > total {
            return Err(PessimistClientError::InvalidQuorumPolicy {
                reason: format!("threshold {threshold} exceeds total weight {total}"),
            });
        }
        Ok(())
    }
}
