//! Deterministic quorum selection over a batch of signed claims.
//!
//! Grouping uses ordered maps keyed by `(chain_id, height, root)` so every
//! verifying node walks the groups in the same order.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::B256;
use pessimist_types::{AttestorId, SignedPacketCommitmentsClaim};

use crate::{client_state::ClientState, error::PessimistClientError};

/// A `(height, root)` that reached quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpdate {
    /// Accepted height
    pub height: u64,
    /// Accepted packet-commitment root
    pub commitment_root: B256,
    /// Earliest `collected_at` among the supporting claims
    pub timestamp: u64,
    /// Weight the group reached
    pub weight: u64,
    /// Attestors that signed the accepted root, in id order
    pub attestors: Vec<AttestorId>,
}

/// Successful aggregation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregated {
    /// A new height reached quorum
    Accepted(AcceptedUpdate),
    /// The claims re-attest the current trusted height and root
    AlreadyTrusted,
}

type GroupKey = (String, u64, B256);
type Group = BTreeMap<AttestorId, u64>;

#[derive(Default)]
struct Tally {
    non_member: usize,
    wrong_chain: Option<String>,
    bad_signature: usize,
    stale: usize,
    fresh: usize,
}

/// Select the update supported by a quorum of `claims`.
///
/// Claims from non-members, for another chain, with an invalid signature, or
/// at a height not above the trusted height are discarded. Each remaining
/// attestor counts once per `(chain_id, height, root)` group, and an attestor
/// that signed several roots for one height counts in each of them.
///
/// # Errors
/// - [`PessimistClientError::ConflictingQuorum`] if two roots reach quorum
///   at the same height, or a root reaches quorum at a height where a member
///   signed more than one root
/// - [`PessimistClientError::QuorumNotMet`] if no new group reaches quorum
/// - [`PessimistClientError::NoClaims`], [`PessimistClientError::UnauthorizedAttestors`],
///   [`PessimistClientError::StaleClaims`], [`PessimistClientError::InvalidSignatures`]
///   or [`PessimistClientError::ChainMismatch`] when nothing usable is left
pub fn aggregate(
    claims: &[SignedPacketCommitmentsClaim],
    client_state: &ClientState,
) -> Result<Aggregated, PessimistClientError> {
    if claims.is_empty() {
        return Err(PessimistClientError::NoClaims);
    }

    let set = &client_state.attestor_set;
    let policy = &client_state.quorum_policy;

    let mut tally = Tally::default();
    let mut fresh: BTreeMap<GroupKey, Group> = BTreeMap::new();
    let mut stale: BTreeMap<GroupKey, Group> = BTreeMap::new();
    let mut roots_signed: BTreeMap<(AttestorId, u64), BTreeSet<B256>> = BTreeMap::new();

    for claim in claims {
        let Some(info) = set.get(&claim.attestor_id) else {
            tally.non_member += 1;
            continue;
        };
        if claim.chain_id() != client_state.chain_id {
            tally.wrong_chain = Some(claim.chain_id().to_string());
            continue;
        }
        if !claim.is_signed_by(info.address) {
            tally.bad_signature += 1;
            continue;
        }

        let snapshot = &claim.snapshot;
        roots_signed
            .entry((claim.attestor_id.clone(), snapshot.height))
            .or_default()
            .insert(snapshot.commitment_root);

        let groups = if snapshot.height > client_state.latest_trusted_height {
            tally.fresh += 1;
            &mut fresh
        } else {
            tally.stale += 1;
            &mut stale
        };
        groups
            .entry((
                snapshot.chain_id.clone(),
                snapshot.height,
                snapshot.commitment_root,
            ))
            .or_default()
            .entry(claim.attestor_id.clone())
            .and_modify(|collected_at| *collected_at = (*collected_at).min(snapshot.collected_at))
            .or_insert(snapshot.collected_at);
    }

    // Fresh heights at which some member signed more than one root.
    let equivocated: BTreeSet<u64> = roots_signed
        .into_iter()
        .filter(|((_, height), roots)| {
            roots.len() > 1 && *height > client_state.latest_trusted_height
        })
        .map(|((_, height), _)| height)
        .collect();

    let weigh = |group: &Group| -> u64 {
        group
            .keys()
            .filter_map(|id| set.get(id))
            .fold(0u64, |acc, info| acc.saturating_add(policy.weight_of(info)))
    };

    let mut quorums: BTreeMap<u64, Vec<(&GroupKey, &Group, u64)>> = BTreeMap::new();
    let mut best_weight = 0;
    for (key, group) in &fresh {
        let weight = weigh(group);
        best_weight = best_weight.max(weight);
        if policy.is_met(weight) {
            quorums.entry(key.1).or_default().push((key, group, weight));
        }
    }

    if let Some((height, _)) = quorums
        .iter()
        .find(|(height, groups)| groups.len() > 1 || equivocated.contains(*height))
    {
        return Err(PessimistClientError::ConflictingQuorum { height: *height });
    }

    if let Some((_, groups)) = quorums.iter().next_back() {
        let (key, group, weight) = &groups[0];
        return Ok(Aggregated::Accepted(AcceptedUpdate {
            height: key.1,
            commitment_root: key.2,
            timestamp: group.values().copied().min().unwrap_or_default(),
            weight: *weight,
            attestors: group.keys().cloned().collect(),
        }));
    }

    let trusted_key = (
        client_state.chain_id.clone(),
        client_state.latest_trusted_height,
        client_state.latest_trusted_root,
    );
    if stale
        .get(&trusted_key)
        .is_some_and(|group| policy.is_met(weigh(group)))
    {
        return Ok(Aggregated::AlreadyTrusted);
    }

    if tally.fresh > 0 {
        return Err(PessimistClientError::QuorumNotMet {
            best_weight,
            threshold: policy.threshold(),
        });
    }
    if tally.non_member == claims.len() {
        return Err(PessimistClientError::UnauthorizedAttestors);
    }
    if tally.stale > 0 {
        return Err(PessimistClientError::StaleClaims {
            latest_trusted_height: client_state.latest_trusted_height,
        });
    }
    if tally.bad_signature > 0 {
        return Err(PessimistClientError::InvalidSignatures);
    }
    if let Some(got) = tally.wrong_chain {
        return Err(PessimistClientError::ChainMismatch {
            expected: client_state.chain_id.clone(),
            got,
        });
    }
    Err(PessimistClientError::QuorumNotMet {
        best_weight,
        threshold: policy.threshold(),
    })
}

#[cfg(test)]
mod aggregate {
    use super::*;
    use crate::{
        quorum::QuorumPolicy,
        test_utils::{
            attestor_id, client_state, root, sign_snapshot, signed_claim, snapshot,
            weighted_attestor_set,
        },
    };

    #[test]
    fn accepts_single_quorum_group() {
        let cs = client_state(3, 2);
        let claims = [
            signed_claim(0, 100, root(1)),
            signed_claim(1, 100, root(1)),
            signed_claim(2, 100, root(2)),
        ];

        let res = super::aggregate(&claims, &cs).unwrap();
        assert_eq!(
            res,
            Aggregated::Accepted(AcceptedUpdate {
                height: 100,
                commitment_root: root(1),
                timestamp: 1_700_000_100,
                weight: 2,
                attestors: vec![attestor_id(0), attestor_id(1)],
            })
        );
    }

    #[test]
    fn result_does_not_depend_on_claim_order() {
        let cs = client_state(3, 2);
        let mut claims = vec![
            signed_claim(2, 101, root(3)),
            signed_claim(0, 100, root(1)),
            signed_claim(1, 100, root(1)),
            signed_claim(0, 101, root(3)),
        ];
        let forward = super::aggregate(&claims, &cs).unwrap();
        claims.reverse();
        let backward = super::aggregate(&claims, &cs).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn highest_quorum_height_wins() {
        let cs = client_state(3, 2);
        let claims = [
            signed_claim(0, 100, root(1)),
            signed_claim(1, 100, root(1)),
            signed_claim(0, 105, root(5)),
            signed_claim(2, 105, root(5)),
        ];

        let Aggregated::Accepted(update) = super::aggregate(&claims, &cs).unwrap() else {
            panic!("expected accepted update");
        };
        assert_eq!(update.height, 105);
        assert_eq!(update.commitment_root, root(5));
    }

    #[test]
    fn fails_on_conflicting_quorum() {
        let cs = client_state(4, 2);
        let claims = [
            signed_claim(0, 100, root(1)),
            signed_claim(1, 100, root(1)),
            signed_claim(2, 100, root(2)),
            signed_claim(3, 100, root(2)),
        ];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::ConflictingQuorum { height: 100 })
        );
    }

    #[test]
    fn conflict_at_lower_height_still_detected() {
        let cs = client_state(5, 2);
        let claims = [
            signed_claim(0, 100, root(1)),
            signed_claim(1, 100, root(1)),
            signed_claim(2, 100, root(2)),
            signed_claim(3, 100, root(2)),
            signed_claim(0, 110, root(7)),
            signed_claim(4, 110, root(7)),
        ];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::ConflictingQuorum { height: 100 })
        );
    }

    #[test]
    fn fails_when_quorum_not_met() {
        let cs = client_state(3, 2);
        let claims = [signed_claim(0, 100, root(1)), signed_claim(1, 100, root(2))];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::QuorumNotMet {
                best_weight: 1,
                threshold: 2
            })
        );
    }

    #[test]
    fn duplicate_claims_count_once() {
        let cs = client_state(3, 2);
        let claim = signed_claim(0, 100, root(1));
        let claims = [claim.clone(), claim.clone(), claim];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::QuorumNotMet {
                best_weight: 1,
                threshold: 2
            })
        );
    }

    #[test]
    fn equivocating_attestor_counts_for_each_root() {
        let cs = client_state(4, 2);
        let claims = [
            signed_claim(0, 100, root(1)),
            signed_claim(1, 100, root(1)),
            signed_claim(0, 100, root(2)),
            signed_claim(2, 100, root(2)),
            signed_claim(3, 100, root(2)),
        ];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::ConflictingQuorum { height: 100 })
        );
        assert_eq!(
            super::aggregate(&claims[..4], &client_state(3, 2)),
            Err(PessimistClientError::ConflictingQuorum { height: 100 })
        );
    }

    #[test]
    fn equivocation_never_hands_quorum_to_a_root() {
        let cs = client_state(3, 2);
        let claims = [
            signed_claim(0, 100, root(1)),
            signed_claim(0, 100, root(2)),
            signed_claim(1, 100, root(2)),
        ];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::ConflictingQuorum { height: 100 })
        );
    }

    #[test]
    fn equivocation_below_threshold_is_quorum_not_met() {
        let cs = client_state(3, 3);
        let claims = [signed_claim(0, 100, root(1)), signed_claim(0, 100, root(2))];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::QuorumNotMet {
                best_weight: 1,
                threshold: 3
            })
        );
    }

    #[test]
    fn non_member_does_not_count() {
        let cs = client_state(3, 2);
        // Attestor D (index 3) is not part of the three member set.
        let claims = [signed_claim(0, 100, root(1)), signed_claim(3, 100, root(1))];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::QuorumNotMet {
                best_weight: 1,
                threshold: 2
            })
        );
    }

    #[test]
    fn only_non_members_is_unauthorized() {
        let cs = client_state(3, 2);
        let claims = [signed_claim(3, 100, root(1)), signed_claim(4, 100, root(1))];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::UnauthorizedAttestors)
        );
    }

    #[test]
    fn member_id_with_foreign_key_is_invalid_signature() {
        let cs = client_state(3, 2);
        let mut forged = signed_claim(3, 100, root(1));
        forged.attestor_id = attestor_id(0);

        assert_eq!(
            super::aggregate(&[forged], &cs),
            Err(PessimistClientError::InvalidSignatures)
        );
    }

    #[test]
    fn tampered_snapshot_is_discarded() {
        let cs = client_state(3, 2);
        let mut tampered = signed_claim(1, 100, root(1));
        tampered.snapshot.commitment_root = root(9);
        let claims = [signed_claim(0, 100, root(9)), tampered];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::QuorumNotMet {
                best_weight: 1,
                threshold: 2
            })
        );
    }

    #[test]
    fn fails_on_other_chain() {
        let cs = client_state(3, 1);
        let mut other = snapshot(100, root(1));
        other.chain_id = "chain-b".into();
        let claim = sign_snapshot(0, other);

        assert_eq!(
            super::aggregate(&[claim], &cs),
            Err(PessimistClientError::ChainMismatch {
                expected: "chain-a".into(),
                got: "chain-b".into()
            })
        );
    }

    #[test]
    fn rejects_claims_at_or_below_trusted_height() {
        let mut cs = client_state(3, 2);
        cs.latest_trusted_height = 100;
        cs.latest_trusted_root = root(1);
        let claims = [signed_claim(0, 99, root(4)), signed_claim(1, 99, root(4))];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Err(PessimistClientError::StaleClaims {
                latest_trusted_height: 100
            })
        );
    }

    #[test]
    fn resubmitted_trusted_claims_are_already_trusted() {
        let mut cs = client_state(3, 2);
        cs.latest_trusted_height = 100;
        cs.latest_trusted_root = root(1);
        let claims = [signed_claim(0, 100, root(1)), signed_claim(1, 100, root(1))];

        assert_eq!(
            super::aggregate(&claims, &cs),
            Ok(Aggregated::AlreadyTrusted)
        );
    }

    #[test]
    fn late_conflicting_claim_is_stale() {
        let mut cs = client_state(3, 2);
        cs.latest_trusted_height = 100;
        cs.latest_trusted_root = root(1);

        assert_eq!(
            super::aggregate(&[signed_claim(2, 100, root(2))], &cs),
            Err(PessimistClientError::StaleClaims {
                latest_trusted_height: 100
            })
        );
    }

    #[test]
    fn weighted_policy_sums_weights() {
        let mut cs = client_state(3, 1);
        cs.attestor_set = weighted_attestor_set(&[5, 1, 1]);
        cs.quorum_policy = QuorumPolicy::Weighted { threshold: 5 };

        let heavy = super::aggregate(&[signed_claim(0, 10, root(1))], &cs).unwrap();
        assert!(matches!(heavy, Aggregated::Accepted(update) if update.weight == 5));

        let light = super::aggregate(
            &[signed_claim(1, 10, root(1)), signed_claim(2, 10, root(1))],
            &cs,
        );
        assert_eq!(
            light,
            Err(PessimistClientError::QuorumNotMet {
                best_weight: 2,
                threshold: 5
            })
        );
    }

    #[test]
    fn fails_on_empty_batch() {
        assert_eq!(
            super::aggregate(&[], &client_state(3, 2)),
            Err(PessimistClientError::NoClaims)
        );
    }
}
