//! The pessimistic light client state machine

use std::collections::BTreeMap;

use alloy_primitives::B256;
use pessimist_types::{MembershipProof, PacketCommitment, SignedPacketCommitmentsClaim};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{aggregate, Aggregated},
    attestor_set::AttestorSet,
    client_state::{ClientState, Status},
    consensus_state::ConsensusState,
    error::PessimistClientError,
    membership, misbehaviour,
    quorum::QuorumPolicy,
    update::{prune_consensus_states, update_consensus_state},
};

/// Result of a successful [`PessimisticClient::update_client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A new height became trusted
    Updated {
        /// New latest trusted height
        height: u64,
        /// Root trusted at `height`
        root: B256,
    },
    /// The claims re-attested what is already trusted
    Unchanged,
}

/// Client state plus the retained history of trusted roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PessimisticClient {
    client_state: ClientState,
    consensus_states: BTreeMap<u64, ConsensusState>,
}

impl PessimisticClient {
    /// Build a client, optionally seeded with a trusted consensus state.
    ///
    /// # Errors
    /// Fails if the client state is invalid or the initial consensus state
    /// does not match the latest trusted height and root.
    pub fn new(
        client_state: ClientState,
        initial: Option<ConsensusState>,
    ) -> Result<Self, PessimistClientError> {
        client_state.validate()?;

        let consensus_states = match initial {
            Some(consensus_state) => {
                if consensus_state.height != client_state.latest_trusted_height
                    || consensus_state.commitment_root != client_state.latest_trusted_root
                {
                    return Err(PessimistClientError::InvalidClientState {
                        reason: "initial consensus state must match the latest trusted root"
                            .into(),
                    });
                }
                BTreeMap::from([(consensus_state.height, consensus_state)])
            }
            None if client_state.latest_trusted_height == 0 => BTreeMap::new(),
            None => {
                return Err(PessimistClientError::InvalidClientState {
                    reason: "a trusted height requires an initial consensus state".into(),
                })
            }
        };

        Ok(Self {
            client_state,
            consensus_states,
        })
    }

    /// Rebuild a client from persisted parts.
    #[must_use]
    pub const fn from_parts(
        client_state: ClientState,
        consensus_states: BTreeMap<u64, ConsensusState>,
    ) -> Self {
        Self {
            client_state,
            consensus_states,
        }
    }

    /// The current client state.
    #[must_use]
    pub const fn client_state(&self) -> &ClientState {
        &self.client_state
    }

    /// Retained consensus states by height.
    #[must_use]
    pub const fn consensus_states(&self) -> &BTreeMap<u64, ConsensusState> {
        &self.consensus_states
    }

    /// Retained consensus state at `height`.
    #[must_use]
    pub fn consensus_state(&self, height: u64) -> Option<&ConsensusState> {
        self.consensus_states.get(&height)
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.client_state.status
    }

    /// Latest trusted height.
    #[must_use]
    pub const fn latest_height(&self) -> u64 {
        self.client_state.latest_trusted_height
    }

    /// Earliest attestation time of the root trusted at `height`.
    ///
    /// # Errors
    /// [`PessimistClientError::UnknownRoot`] if no root is retained there.
    pub fn timestamp_at_height(&self, height: u64) -> Result<u64, PessimistClientError> {
        self.consensus_state(height)
            .map(|cs| cs.timestamp)
            .ok_or(PessimistClientError::UnknownRoot { height })
    }

    /// Advance the client with a batch of signed claims.
    ///
    /// Two roots reaching quorum at one height freeze the client; the freeze
    /// is kept even though an error is returned.
    ///
    /// # Errors
    /// [`PessimistClientError::ClientFrozen`] if frozen, otherwise any
    /// aggregation error.
    pub fn update_client(
        &mut self,
        claims: &[SignedPacketCommitmentsClaim],
    ) -> Result<UpdateOutcome, PessimistClientError> {
        self.client_state.ensure_active()?;

        let update = match aggregate(claims, &self.client_state) {
            Ok(Aggregated::Accepted(update)) => update,
            Ok(Aggregated::AlreadyTrusted) => return Ok(UpdateOutcome::Unchanged),
            Err(PessimistClientError::ConflictingQuorum { height }) => {
                self.freeze(height);
                return Err(PessimistClientError::ConflictingQuorum { height });
            }
            Err(e) => return Err(e),
        };

        let (consensus_state, new_client_state) =
            update_consensus_state(&self.client_state, &update);
        let Some(new_client_state) = new_client_state else {
            return Ok(UpdateOutcome::Unchanged);
        };

        self.consensus_states
            .insert(consensus_state.height, consensus_state);
        self.client_state = new_client_state;
        prune_consensus_states(&self.client_state, &mut self.consensus_states);

        Ok(UpdateOutcome::Updated {
            height: update.height,
            root: update.commitment_root,
        })
    }

    /// See [`membership::verify_membership`]. The proof is passed decoded.
    ///
    /// # Errors
    /// See [`membership::verify_membership`].
    pub fn verify_membership(
        &self,
        height: u64,
        root: &B256,
        proof: Option<&MembershipProof>,
    ) -> Result<(), PessimistClientError> {
        membership::verify_membership(
            &self.client_state,
            &self.consensus_states,
            height,
            root,
            proof,
        )
    }

    /// See [`membership::verify_packet_commitment`].
    ///
    /// # Errors
    /// See [`membership::verify_packet_commitment`].
    pub fn verify_packet_commitment(
        &self,
        height: u64,
        packet: &PacketCommitment,
        proof: &MembershipProof,
    ) -> Result<(), PessimistClientError> {
        membership::verify_packet_commitment(
            &self.client_state,
            &self.consensus_states,
            height,
            packet,
            proof,
        )
    }

    /// Whether `claims` contain conflicting quorums.
    #[must_use]
    pub fn check_for_misbehaviour(&self, claims: &[SignedPacketCommitmentsClaim]) -> bool {
        misbehaviour::find_conflicting_quorum(&self.client_state, claims).is_some()
    }

    /// Freeze the client at `height`.
    pub fn freeze(&mut self, height: u64) {
        misbehaviour::freeze(&mut self.client_state, height);
    }

    /// Replace the attestor set and quorum policy.
    ///
    /// # Errors
    /// Fails if `quorum_policy` cannot be met by `attestor_set`.
    pub fn update_attestor_set(
        &mut self,
        attestor_set: AttestorSet,
        quorum_policy: QuorumPolicy,
    ) -> Result<(), PessimistClientError> {
        quorum_policy.validate(&attestor_set)?;
        self.client_state.attestor_set = attestor_set;
        self.client_state.quorum_policy = quorum_policy;
        Ok(())
    }

    /// Leave the frozen state by adopting `new_state`.
    ///
    /// History above the new latest height is dropped.
    ///
    /// # Errors
    /// - [`PessimistClientError::ClientNotFrozen`] if the client is active
    /// - [`PessimistClientError::InvalidClientState`] if `new_state` is
    ///   frozen, invalid, or for another client or chain
    pub fn recover(&mut self, new_state: ClientState) -> Result<(), PessimistClientError> {
        if !self.client_state.is_frozen() {
            return Err(PessimistClientError::ClientNotFrozen(
                self.client_state.client_id.clone(),
            ));
        }
        new_state.validate()?;
        if new_state.is_frozen()
            || new_state.client_id != self.client_state.client_id
            || new_state.chain_id != self.client_state.chain_id
        {
            return Err(PessimistClientError::InvalidClientState {
                reason: "substitute must be active and track the same client and chain".into(),
            });
        }

        self.consensus_states
            .retain(|height, _| *height <= new_state.latest_trusted_height);
        if new_state.latest_trusted_height > 0 {
            let consensus_state = self
                .consensus_states
                .entry(new_state.latest_trusted_height)
                .or_insert(ConsensusState {
                    height: new_state.latest_trusted_height,
                    commitment_root: new_state.latest_trusted_root,
                    timestamp: 0,
                });
            consensus_state.commitment_root = new_state.latest_trusted_root;
        }
        self.client_state = new_state;
        prune_consensus_states(&self.client_state, &mut self.consensus_states);
        Ok(())
    }
}


#[cfg(test)]
mod verify_membership {
    use super::*;
    use crate::test_utils::{client_state, root, signed_claim};
    use pessimist_types::{merkle::CommitmentTree, ProofBundle};

    fn tree() -> CommitmentTree {
        CommitmentTree::new(
            (1..=5)
                .map(|n| PacketCommitment {
                    path: B256::repeat_byte(n),
                    commitment: B256::repeat_byte(0x40 + n),
                })
                .collect(),
        )
    }

    fn trusted_at(height: u64, trusted_root: B256) -> PessimisticClient {
        let mut client = PessimisticClient::new(client_state(3, 2), None).unwrap();
        client
            .update_client(&[
                signed_claim(0, height, trusted_root),
                signed_claim(1, height, trusted_root),
            ])
            .unwrap();
        client
    }

    #[test]
    fn proof_from_earlier_height_against_latest_root() {
        let tree = tree();
        let client = trusted_at(100, tree.root());
        let bundle = ProofBundle::from_tree("chain-a", 90, &tree);
        let proof = bundle.proof_for(&B256::repeat_byte(3)).unwrap();

        assert!(client.consensus_state(90).is_none());
        client
            .verify_membership(90, &tree.root(), Some(proof))
            .unwrap();
        client
            .verify_packet_commitment(90, &proof.leaf, proof)
            .unwrap();
    }

    #[test]
    fn above_latest_is_not_yet_trusted_for_any_root() {
        let client = trusted_at(100, root(1));

        for candidate in [root(1), root(2)] {
            assert_eq!(
                client.verify_membership(101, &candidate, None),
                Err(PessimistClientError::HeightNotYetTrusted {
                    height: 101,
                    latest_trusted_height: 100
                })
            );
        }
    }

    #[test]
    fn without_proof_uses_retained_history() {
        let client = trusted_at(100, root(1));

        client.verify_membership(100, &root(1), None).unwrap();
        assert_eq!(
            client.verify_membership(100, &root(2), None),
            Err(PessimistClientError::RootMismatch { height: 100 })
        );
        assert_eq!(
            client.verify_membership(50, &root(1), None),
            Err(PessimistClientError::UnknownRoot { height: 50 })
        );
    }

    #[test]
    fn proof_for_untrusted_root_is_rejected() {
        let tree = tree();
        let client = trusted_at(100, root(9));
        let bundle = ProofBundle::from_tree("chain-a", 90, &tree);
        let proof = &bundle.proofs[0];

        assert!(matches!(
            client.verify_membership(90, &tree.root(), Some(proof)),
            Err(PessimistClientError::InvalidProof { .. })
        ));
    }

    #[test]
    fn proof_for_older_root_is_rejected_at_another_height() {
        let tree = tree();
        let mut client = PessimisticClient::new(client_state(3, 2), None).unwrap();
        for (height, trusted_root) in [(90, tree.root()), (95, root(5)), (100, root(7))] {
            client
                .update_client(&[
                    signed_claim(0, height, trusted_root),
                    signed_claim(1, height, trusted_root),
                ])
                .unwrap();
        }
        let at_90 = ProofBundle::from_tree("chain-a", 90, &tree);
        let at_95 = ProofBundle::from_tree("chain-a", 95, &tree);

        client
            .verify_membership(90, &tree.root(), Some(&at_90.proofs[0]))
            .unwrap();
        assert_eq!(
            client.verify_membership(95, &tree.root(), None),
            Err(PessimistClientError::RootMismatch { height: 95 })
        );
        for proof in [&at_90.proofs[0], &at_95.proofs[0]] {
            assert!(matches!(
                client.verify_membership(95, &tree.root(), Some(proof)),
                Err(PessimistClientError::InvalidProof { .. })
            ));
        }
    }

    #[test]
    fn proof_for_other_packet_is_rejected() {
        let tree = tree();
        let client = trusted_at(100, tree.root());
        let bundle = ProofBundle::from_tree("chain-a", 90, &tree);
        let other = PacketCommitment {
            path: B256::repeat_byte(3),
            commitment: B256::repeat_byte(0xff),
        };

        assert!(matches!(
            client.verify_packet_commitment(90, &other, &bundle.proofs[2]),
            Err(PessimistClientError::InvalidProof { .. })
        ));
    }

    #[test]
    fn frozen_client_refuses_queries() {
        let mut client = trusted_at(100, root(1));
        client.freeze(100);

        assert_eq!(
            client.verify_membership(100, &root(1), None),
            Err(PessimistClientError::ClientFrozen { height: 100 })
        );
    }
}
