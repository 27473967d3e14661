//! Pessimistic client state

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::{attestor_set::AttestorSet, error::PessimistClientError, quorum::QuorumPolicy};

/// Lifecycle of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Accepting updates and answering queries
    Active,
    /// Equivocation detected; only governance recovery leaves this state
    Frozen {
        /// Height the conflicting quorum was seen at
        height: u64,
    },
}

/// Everything a client trusts about its source chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    /// Identifier the client is stored under
    pub client_id: String,
    /// Source chain being tracked
    pub chain_id: String,
    /// Registered attestors
    pub attestor_set: AttestorSet,
    /// Threshold claims must reach
    pub quorum_policy: QuorumPolicy,
    /// Highest height with a trusted root
    pub latest_trusted_height: u64,
    /// Root trusted at `latest_trusted_height`
    pub latest_trusted_root: B256,
    /// Whether the client is active
    pub status: Status,
    /// Number of heights below the latest whose roots are retained
    pub history_window: u64,
}

impl ClientState {
    /// A fresh, active client with nothing trusted yet.
    ///
    /// # Errors
    /// Fails if the quorum policy is invalid for the attestor set.
    pub fn new(
        client_id: impl Into<String>,
        chain_id: impl Into<String>,
        attestor_set: AttestorSet,
        quorum_policy: QuorumPolicy,
        history_window: u64,
    ) -> Result<Self, PessimistClientError> {
        let client_state = Self {
            client_id: client_id.into(),
            chain_id: chain_id.into(),
            attestor_set,
            quorum_policy,
            latest_trusted_height: 0,
            latest_trusted_root: B256::ZERO,
            status: Status::Active,
            history_window,
        };
        client_state.validate()?;
        Ok(client_state)
    }

    /// Check the identifiers and the quorum policy.
    ///
    /// # Errors
    /// Fails on empty identifiers, a client id containing `/` or an invalid
    /// quorum policy.
    pub fn validate(&self) -> Result<(), PessimistClientError> {
        if self.client_id.is_empty() || self.chain_id.is_empty() {
            return Err(PessimistClientError::InvalidClientState {
                reason: "client id and chain id must not be empty".into(),
            });
        }
        // Store keys are `/` separated.
        if self.client_id.contains('/') {
            return Err(PessimistClientError::InvalidClientState {
                reason: format!("client id `{}` must not contain `/`", self.client_id),
            });
        }
        self.quorum_policy.validate(&self.attestor_set)
    }

    /// Whether the client is frozen.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        matches!(self.status, Status::Frozen { .. })
    }

    /// Fail with [`PessimistClientError::ClientFrozen`] if frozen.
    ///
    /// # Errors
    /// See above.
    pub const fn ensure_active(&self) -> Result<(), PessimistClientError> {
        match self.status {
            Status::Active => Ok(()),
            Status::Frozen { height } => Err(PessimistClientError::ClientFrozen { height }),
        }
    }

    /// Lowest height whose root is still retained.
    #[must_use]
    pub const fn oldest_retained_height(&self) -> u64 {
        self.latest_trusted_height
            .saturating_sub(self.history_window)
    }
}

#[cfg(test)]
mod new {
    use super::*;
    use crate::test_utils::attestor_set;

    #[test]
    fn starts_active_and_untrusted() {
        let cs = ClientState::new(
            "07-pessimist-0",
            "chain-a",
            attestor_set(3),
            QuorumPolicy::Count { threshold: 2 },
            10,
        )
        .unwrap();

        assert_eq!(cs.status, Status::Active);
        assert_eq!(cs.latest_trusted_height, 0);
        assert!(cs.ensure_active().is_ok());
    }

    #[test]
    fn fails_on_threshold_above_set() {
        let res = ClientState::new(
            "07-pessimist-0",
            "chain-a",
            attestor_set(3),
            QuorumPolicy::Count { threshold: 4 },
            10,
        );
        assert!(matches!(
            res,
            Err(PessimistClientError::InvalidQuorumPolicy { .. })
        ));
    }

    #[test]
    fn fails_on_empty_chain_id() {
        let res = ClientState::new(
            "07-pessimist-0",
            "",
            attestor_set(3),
            QuorumPolicy::Count { threshold: 1 },
            10,
        );
        assert!(matches!(
            res,
            Err(PessimistClientError::InvalidClientState { .. })
        ));
    }
}

#[cfg(test)]
mod oldest_retained_height {
    use crate::test_utils::client_state;

    #[test]
    fn saturates_at_zero() {
        let mut cs = client_state(3, 2);
        cs.history_window = 50;
        cs.latest_trusted_height = 20;
        assert_eq!(cs.oldest_retained_height(), 0);

        cs.latest_trusted_height = 100;
        assert_eq!(cs.oldest_retained_height(), 50);
    }
}
