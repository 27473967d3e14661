//! Host chain entry points for pessimistic clients.
//!
//! Messages arrive as bytes and are decoded with the module's [`Codec`].
//! Clients are persisted into a [`ClientStore`] after every state change,
//! including a freeze that is reported as an error.

use std::collections::BTreeSet;

use alloy_primitives::B256;
use pessimist_types::{
    codec::Codec, MembershipProof, PacketCommitment, SignedPacketCommitmentsClaim,
};
use serde::{Deserialize, Serialize};

use crate::{
    attestor_set::AttestorSet,
    client::{PessimisticClient, UpdateOutcome},
    client_state::{ClientState, Status},
    consensus_state::ConsensusState,
    error::PessimistClientError,
    quorum::QuorumPolicy,
    store::{client_state_key, consensus_state_key, consensus_state_prefix, ClientStore},
};

/// Payload of [`LightClientModule::create_client`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClientMsg {
    /// Initial client state
    pub client_state: ClientState,
    /// Root trusted at the initial height, if any
    pub consensus_state: Option<ConsensusState>,
}

/// Payload of [`LightClientModule::update_attestor_set`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAttestorSetMsg {
    /// Replacement attestor set
    pub attestor_set: AttestorSet,
    /// Policy applied to the new set
    pub quorum_policy: QuorumPolicy,
}

/// Pessimistic client module backed by a key-value store.
pub struct LightClientModule<S: ClientStore, C: Codec> {
    store: S,
    codec: C,
    authority: String,
    allowed_submitters: BTreeSet<String>,
}

impl<S: ClientStore, C: Codec> LightClientModule<S, C> {
    /// Module governed by `authority`, open to any submitter.
    pub fn new(store: S, codec: C, authority: impl Into<String>) -> Self {
        Self {
            store,
            codec,
            authority: authority.into(),
            allowed_submitters: BTreeSet::new(),
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Restrict client updates to `submitters`. An empty set allows anyone.
    ///
    /// # Errors
    /// [`PessimistClientError::Unauthorized`] unless `sender` is the authority.
    pub fn set_submitters(
        &mut self,
        sender: &str,
        submitters: impl IntoIterator<Item = String>,
    ) -> Result<(), PessimistClientError> {
        self.ensure_authority(sender, "set submitters")?;
        self.allowed_submitters = submitters.into_iter().collect();
        Ok(())
    }

    /// Create a client from an encoded [`CreateClientMsg`].
    ///
    /// # Errors
    /// Fails if `sender` is not the authority, the message does not decode or
    /// validate, or the client id is taken.
    pub fn create_client(
        &mut self,
        sender: &str,
        msg: &[u8],
    ) -> Result<String, PessimistClientError> {
        self.ensure_authority(sender, "create clients")?;
        let msg: CreateClientMsg = self.codec.decode(msg)?;

        let client_id = msg.client_state.client_id.clone();
        if self.store.get(&client_state_key(&client_id)).is_some() {
            return Err(PessimistClientError::ClientAlreadyExists(client_id));
        }
        if msg.client_state.is_frozen() {
            return Err(PessimistClientError::InvalidClientState {
                reason: "new clients must be active".into(),
            });
        }

        let client = PessimisticClient::new(msg.client_state, msg.consensus_state)?;
        self.save(&client)?;
        Ok(client_id)
    }

    /// Apply an encoded batch of signed claims to `client_id`.
    ///
    /// # Errors
    /// [`PessimistClientError::Unauthorized`] for disallowed submitters, decode
    /// errors, or any error of [`PessimisticClient::update_client`]. A
    /// conflicting quorum is persisted as a freeze before it is returned.
    pub fn update_client(
        &mut self,
        sender: &str,
        client_id: &str,
        claims: &[u8],
    ) -> Result<UpdateOutcome, PessimistClientError> {
        if !self.allowed_submitters.is_empty() && !self.allowed_submitters.contains(sender) {
            return Err(PessimistClientError::Unauthorized {
                sender: sender.to_string(),
                action: "update clients".into(),
            });
        }
        let claims: Vec<SignedPacketCommitmentsClaim> = self.codec.decode(claims)?;

        let mut client = self.load(client_id)?;
        let result = client.update_client(&claims);
        match &result {
            Ok(UpdateOutcome::Updated { .. })
            | Err(PessimistClientError::ConflictingQuorum { .. }) => self.save(&client)?,
            _ => {}
        }
        result
    }

    /// Replace the attestor set of `client_id` from an encoded
    /// [`UpdateAttestorSetMsg`].
    ///
    /// # Errors
    /// Fails if `sender` is not the authority or the new set is invalid.
    pub fn update_attestor_set(
        &mut self,
        sender: &str,
        client_id: &str,
        msg: &[u8],
    ) -> Result<(), PessimistClientError> {
        self.ensure_authority(sender, "update attestor sets")?;
        let msg: UpdateAttestorSetMsg = self.codec.decode(msg)?;

        let mut client = self.load(client_id)?;
        client.update_attestor_set(msg.attestor_set, msg.quorum_policy)?;
        self.save(&client)
    }

    /// Unfreeze `client_id` with an encoded substitute [`ClientState`].
    ///
    /// # Errors
    /// Fails if `sender` is not the authority, the client is not frozen, or
    /// the substitute is invalid.
    pub fn recover_client(
        &mut self,
        sender: &str,
        client_id: &str,
        new_state: &[u8],
    ) -> Result<(), PessimistClientError> {
        self.ensure_authority(sender, "recover clients")?;
        let new_state: ClientState = self.codec.decode(new_state)?;

        let mut client = self.load(client_id)?;
        client.recover(new_state)?;
        self.save(&client)
    }

    /// Check `root` at `height`, with an optional encoded [`MembershipProof`].
    ///
    /// # Errors
    /// See [`PessimisticClient::verify_membership`].
    pub fn verify_membership(
        &self,
        client_id: &str,
        height: u64,
        root: &B256,
        proof: Option<&[u8]>,
    ) -> Result<(), PessimistClientError> {
        let proof: Option<MembershipProof> =
            proof.map(|bytes| self.codec.decode(bytes)).transpose()?;
        self.load(client_id)?
            .verify_membership(height, root, proof.as_ref())
    }

    /// Check that `packet` is committed at `height` with an encoded proof.
    ///
    /// # Errors
    /// See [`PessimisticClient::verify_packet_commitment`].
    pub fn verify_packet_commitment(
        &self,
        client_id: &str,
        height: u64,
        packet: &PacketCommitment,
        proof: &[u8],
    ) -> Result<(), PessimistClientError> {
        let proof: MembershipProof = self.codec.decode(proof)?;
        self.load(client_id)?
            .verify_packet_commitment(height, packet, &proof)
    }

    /// Status of `client_id`.
    ///
    /// # Errors
    /// [`PessimistClientError::ClientNotFound`] for unknown clients.
    pub fn status(&self, client_id: &str) -> Result<Status, PessimistClientError> {
        Ok(self.client_state(client_id)?.status)
    }

    /// Latest trusted height of `client_id`.
    ///
    /// # Errors
    /// [`PessimistClientError::ClientNotFound`] for unknown clients.
    pub fn latest_height(&self, client_id: &str) -> Result<u64, PessimistClientError> {
        Ok(self.client_state(client_id)?.latest_trusted_height)
    }

    /// Attestation time of the root trusted at `height`.
    ///
    /// # Errors
    /// [`PessimistClientError::UnknownRoot`] if no root is retained there.
    pub fn timestamp_at_height(
        &self,
        client_id: &str,
        height: u64,
    ) -> Result<u64, PessimistClientError> {
        self.load(client_id)?.timestamp_at_height(height)
    }

    /// Stored client state of `client_id`.
    ///
    /// # Errors
    /// [`PessimistClientError::ClientNotFound`] for unknown clients.
    pub fn client_state(&self, client_id: &str) -> Result<ClientState, PessimistClientError> {
        let bytes = self
            .store
            .get(&client_state_key(client_id))
            .ok_or_else(|| PessimistClientError::ClientNotFound(client_id.to_string()))?;
        Ok(self.codec.decode(&bytes)?)
    }

    fn ensure_authority(&self, sender: &str, action: &str) -> Result<(), PessimistClientError> {
        if sender == self.authority {
            Ok(())
        } else {
            Err(PessimistClientError::Unauthorized {
                sender: sender.to_string(),
                action: action.to_string(),
            })
        }
    }

    fn load(&self, client_id: &str) -> Result<PessimisticClient, PessimistClientError> {
        let client_state = self.client_state(client_id)?;
        let consensus_states = self
            .store
            .keys_with_prefix(&consensus_state_prefix(client_id))
            .iter()
            .filter_map(|key| self.store.get(key))
            .map(|bytes| -> Result<_, PessimistClientError> {
                let consensus_state: ConsensusState = self.codec.decode(&bytes)?;
                Ok((consensus_state.height, consensus_state))
            })
            .collect::<Result<_, PessimistClientError>>()?;
        Ok(PessimisticClient::from_parts(client_state, consensus_states))
    }

    fn save(&mut self, client: &PessimisticClient) -> Result<(), PessimistClientError> {
        let client_id = client.client_state().client_id.as_str();
        let retained = client.consensus_states();

        for key in self.store.keys_with_prefix(&consensus_state_prefix(client_id)) {
            let stale = retained
                .keys()
                .all(|height| consensus_state_key(client_id, *height) != key);
            if stale {
                self.store.delete(&key);
            }
        }
        for (height, consensus_state) in retained {
            let value = self.codec.encode(consensus_state)?;
            self.store
                .set(consensus_state_key(client_id, *height), value);
        }

        let value = self.codec.encode(client.client_state())?;
        self.store.set(client_state_key(client_id), value);
        Ok(())
    }
}
