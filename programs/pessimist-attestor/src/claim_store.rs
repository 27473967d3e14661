use std::collections::VecDeque;

use indexmap::IndexMap;
use pessimist_types::SignedPacketCommitmentsClaim;

/// Bounded history of one chain's signed claims, oldest first.
pub struct ClaimStore {
    store: VecDeque<(u64, SignedPacketCommitmentsClaim)>,
    max_entries: usize,
}

impl ClaimStore {
    pub fn new(history_size: usize) -> Self {
        let max_entries = history_size.max(1);
        Self {
            store: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Append a claim. Heights at or below the newest entry are ignored.
    pub fn push(&mut self, claim: SignedPacketCommitmentsClaim) {
        let height = claim.height();
        if self.store.back().is_some_and(|(h, _)| *h >= height) {
            tracing::debug!(height, "claim at this height already in store");
            return;
        }

        if self.store.len() == self.max_entries {
            self.store.pop_front();
        }
        self.store.push_back((height, claim));
    }

    pub fn claim_at_height(&self, height: u64) -> Option<&SignedPacketCommitmentsClaim> {
        self.store
            .binary_search_by_key(&height, |(h, _)| *h)
            .ok()
            .map(|index| &self.store[index].1)
    }

    /// All claims from `height` onwards, in height order.
    pub fn claims_from_height(&self, height: u64) -> IndexMap<u64, SignedPacketCommitmentsClaim> {
        self.store
            .iter()
            .filter(|(h, _)| *h >= height)
            .map(|(h, claim)| (*h, claim.clone()))
            .collect()
    }
}

#[cfg(test)]
fn claim(height: u64) -> SignedPacketCommitmentsClaim {
    use pessimist_types::PacketCommitmentSnapshot;

    SignedPacketCommitmentsClaim {
        snapshot: PacketCommitmentSnapshot {
            chain_id: "chain-a".into(),
            height,
            commitment_root: alloy_primitives::B256::repeat_byte(1),
            collected_at: height,
        },
        attestor_id: "A".into(),
        signature: vec![0; 65],
    }
}
