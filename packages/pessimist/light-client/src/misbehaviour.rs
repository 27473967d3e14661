//! Equivocation detection

use pessimist_types::SignedPacketCommitmentsClaim;

use crate::{
    aggregate::aggregate,
    client_state::{ClientState, Status},
    error::PessimistClientError,
};

/// Height at which `claims` contain two roots that both reach quorum.
#[must_use]
pub fn find_conflicting_quorum(
    client_state: &ClientState,
    claims: &[SignedPacketCommitmentsClaim],
) -> Option<u64> {
    match aggregate(claims, client_state) {
        Err(PessimistClientError::ConflictingQuorum { height }) => Some(height),
        _ => None,
    }
}

/// Freeze the client at `height`. Freezing an already frozen client keeps
/// the original height.
pub fn freeze(client_state: &mut ClientState, height: u64) {
    if !client_state.is_frozen() {
        client_state.status = Status::Frozen { height };
    }
}


#[cfg(test)]
mod freeze {
    use super::*;
    use crate::test_utils::client_state;

    #[test]
    fn keeps_first_freeze_height() {
        let mut cs = client_state(3, 2);
        super::freeze(&mut cs, 10);
        super::freeze(&mut cs, 20);
        assert_eq!(cs.status, Status::Frozen { height: 10 });
    }
}
