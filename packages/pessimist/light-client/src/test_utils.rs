//! Test utilities for the pessimistic light client

#![allow(missing_docs, clippy::missing_panics_doc)]

use std::sync::LazyLock;

use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use pessimist_keys::signature::sign;
use pessimist_types::{AttestorId, PacketCommitmentSnapshot, SignedPacketCommitmentsClaim};

use crate::{
    attestor_set::{AttestorInfo, AttestorSet},
    client_state::ClientState,
    quorum::QuorumPolicy,
};

pub const CHAIN_ID: &str = "chain-a";
pub const CLIENT_ID: &str = "07-pessimist-0";
const IDS: [&str; 5] = ["A", "B", "C", "D", "E"];

pub static SIGNERS: LazyLock<Vec<PrivateKeySigner>> = LazyLock::new(|| {
    [[0xcd; 32], [0x02; 32], [0x03; 32], [0x10; 32], [0x1F; 32]]
        .iter()
        .map(|key| PrivateKeySigner::from_slice(key).expect("valid key"))
        .collect()
});

#[must_use]
pub fn attestor_id(index: usize) -> AttestorId {
    IDS[index].into()
}

#[must_use]
pub fn address(index: usize) -> Address {
    SIGNERS[index].address()
}

/// Set of the first `n` fixture attestors, each with weight 1.
#[must_use]
pub fn attestor_set(n: usize) -> AttestorSet {
    weighted_attestor_set(&vec![1; n])
}

/// Set of the first `weights.len()` fixture attestors with the given weights.
#[must_use]
pub fn weighted_attestor_set(weights: &[u64]) -> AttestorSet {
    AttestorSet::new(
        weights
            .iter()
            .enumerate()
            .map(|(index, weight)| AttestorInfo {
                id: attestor_id(index),
                address: address(index),
                weight: *weight,
            })
            .collect(),
    )
    .expect("valid attestor set")
}

/// Count-policy client over the first `n` attestors.
#[must_use]
pub fn client_state(n: usize, threshold: u64) -> ClientState {
    ClientState::new(
        CLIENT_ID,
        CHAIN_ID,
        attestor_set(n),
        QuorumPolicy::Count { threshold },
        100,
    )
    .expect("valid client state")
}

#[must_use]
pub fn root(byte: u8) -> B256 {
    B256::repeat_byte(byte)
}

#[must_use]
pub fn snapshot(height: u64, commitment_root: B256) -> PacketCommitmentSnapshot {
    PacketCommitmentSnapshot {
        chain_id: CHAIN_ID.to_string(),
        height,
        commitment_root,
        collected_at: 1_700_000_000 + height,
    }
}

/// `snapshot` signed by fixture attestor `index`.
#[must_use]
pub fn sign_snapshot(index: usize, snapshot: PacketCommitmentSnapshot) -> SignedPacketCommitmentsClaim {
    let bytes = snapshot.signable_bytes().expect("encodable snapshot");
    let signature = sign(&SIGNERS[index], &bytes).expect("signing should work");
    SignedPacketCommitmentsClaim {
        snapshot,
        attestor_id: attestor_id(index),
        signature: signature.to_vec(),
    }
}

/// Claim by fixture attestor `index` for `root` at `height` on [`CHAIN_ID`].
#[must_use]
pub fn signed_claim(index: usize, height: u64, commitment_root: B256) -> SignedPacketCommitmentsClaim {
    sign_snapshot(index, snapshot(height, commitment_root))
}
