//! Membership verification against trusted roots

use std::collections::BTreeMap;

use alloy_primitives::B256;
use pessimist_types::{MembershipProof, PacketCommitment};

use crate::{
    client_state::ClientState, consensus_state::ConsensusState, error::PessimistClientError,
};

/// Check that `root` is trusted at `height`.
///
/// With a proof taken at `height`, succeeds if the proof folds to `root` and
/// `root` is the latest trusted root or the root retained for `height`. This
/// path needs no attestor claims at `height`. Without a valid proof, `root`
/// must equal the retained root for `height`.
///
/// # Errors
/// - [`PessimistClientError::ClientFrozen`] if the client is frozen
/// - [`PessimistClientError::HeightNotYetTrusted`] if `height` is above the
///   latest trusted height
/// - [`PessimistClientError::InvalidProof`] if a supplied proof does not
///   verify and the history lookup fails too
/// - [`PessimistClientError::UnknownRoot`] if no root is retained for `height`
/// - [`PessimistClientError::RootMismatch`] if the retained root differs
pub fn verify_membership(
    client_state: &ClientState,
    consensus_states: &BTreeMap<u64, ConsensusState>,
    height: u64,
    root: &B256,
    proof: Option<&MembershipProof>,
) -> Result<(), PessimistClientError> {
    client_state.ensure_active()?;

    if height > client_state.latest_trusted_height {
        return Err(PessimistClientError::HeightNotYetTrusted {
            height,
            latest_trusted_height: client_state.latest_trusted_height,
        });
    }

    let history = verify_against_history(consensus_states, height, root);
    let Some(proof) = proof else {
        return history;
    };

    match verify_proof(client_state, consensus_states, height, root, proof) {
        Ok(()) => Ok(()),
        Err(proof_err) => history.map_err(|_| proof_err),
    }
}

/// Check that `packet` is included in the root trusted at `height`.
///
/// # Errors
/// [`PessimistClientError::InvalidProof`] if the proof is for another packet
/// or is malformed, otherwise see [`verify_membership`].
pub fn verify_packet_commitment(
    client_state: &ClientState,
    consensus_states: &BTreeMap<u64, ConsensusState>,
    height: u64,
    packet: &PacketCommitment,
    proof: &MembershipProof,
) -> Result<(), PessimistClientError> {
    if &proof.leaf != packet {
        return Err(PessimistClientError::InvalidProof {
            reason: "proof is for a different packet".into(),
        });
    }
    let root = proof
        .root()
        .map_err(|e| PessimistClientError::InvalidProof {
            reason: e.to_string(),
        })?;

    verify_membership(client_state, consensus_states, height, &root, Some(proof))
}

fn verify_against_history(
    consensus_states: &BTreeMap<u64, ConsensusState>,
    height: u64,
    root: &B256,
) -> Result<(), PessimistClientError> {
    let consensus_state = consensus_states
        .get(&height)
        .ok_or(PessimistClientError::UnknownRoot { height })?;

    if &consensus_state.commitment_root != root {
        return Err(PessimistClientError::RootMismatch { height });
    }
    Ok(())
}

fn verify_proof(
    client_state: &ClientState,
    consensus_states: &BTreeMap<u64, ConsensusState>,
    height: u64,
    root: &B256,
    proof: &MembershipProof,
) -> Result<(), PessimistClientError> {
    if proof.height != height {
        return Err(PessimistClientError::InvalidProof {
            reason: format!("proof is for height {}, not {height}", proof.height),
        });
    }
    if !proof.proves(root) {
        return Err(PessimistClientError::InvalidProof {
            reason: "proof does not fold to the queried root".into(),
        });
    }

    let retained = consensus_states
        .get(&height)
        .is_some_and(|cs| &cs.commitment_root == root);
    if root == &client_state.latest_trusted_root || retained {
        Ok(())
    } else {
        Err(PessimistClientError::InvalidProof {
            reason: "proof root is not a trusted root".into(),
        })
    }
}
