//! Applying accepted updates

use std::collections::BTreeMap;

use crate::{
    aggregate::AcceptedUpdate, client_state::ClientState, consensus_state::ConsensusState,
};

/// Consensus state for `update`, and the advanced client state if the
/// update moves the trusted height forward.
///
/// The trusted height never decreases: an update at or below it yields
/// `None` for the client state.
#[must_use]
pub fn update_consensus_state(
    current_client_state: &ClientState,
    update: &AcceptedUpdate,
) -> (ConsensusState, Option<ClientState>) {
    let consensus_state = ConsensusState {
        height: update.height,
        commitment_root: update.commitment_root,
        timestamp: update.timestamp,
    };

    let height_has_progressed = update.height > current_client_state.latest_trusted_height;
    let new_client_state = height_has_progressed.then(|| ClientState {
        latest_trusted_height: update.height,
        latest_trusted_root: update.commitment_root,
        ..current_client_state.clone()
    });

    (consensus_state, new_client_state)
}

/// Drop consensus states that fell out of the history window.
///
/// Returns the removed heights in ascending order.
pub fn prune_consensus_states(
    client_state: &ClientState,
    consensus_states: &mut BTreeMap<u64, ConsensusState>,
) -> Vec<u64> {
    let retained = consensus_states.split_off(&client_state.oldest_retained_height());
    let pruned = std::mem::replace(consensus_states, retained);
    pruned.into_keys().collect()
}


#[cfg(test)]
mod prune_consensus_states {
    use super::*;
    use crate::test_utils::{client_state, root};

    #[test]
    fn keeps_window_below_latest() {
        let mut cs = client_state(3, 2);
        cs.history_window = 10;
        cs.latest_trusted_height = 30;

        let mut states: BTreeMap<u64, ConsensusState> = [5, 19, 20, 25, 30]
            .into_iter()
            .map(|height| {
                (
                    height,
                    ConsensusState {
                        height,
                        commitment_root: root(1),
                        timestamp: height,
                    },
                )
            })
            .collect();

        let pruned = super::prune_consensus_states(&cs, &mut states);

        assert_eq!(pruned, vec![5, 19]);
        assert_eq!(states.keys().copied().collect::<Vec<_>>(), vec![20, 25, 30]);
    }
}
