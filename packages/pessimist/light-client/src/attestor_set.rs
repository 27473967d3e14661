//! Registered attestors of a client.

use alloy_primitives::Address;
use pessimist_types::AttestorId;
use serde::{Deserialize, Serialize};

use crate::error::PessimistClientError;

/// One registered attestor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestorInfo {
    /// Identifier claims are signed under
    pub id: AttestorId,
    /// Address recovered from the attestor's signatures
    pub address: Address,
    /// Weight under a weighted quorum policy
    pub weight: u64,
}

/// Attestors ordered by id. Ids and addresses are unique, weights non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AttestorInfo>", into = "Vec<AttestorInfo>")]
pub struct AttestorSet {
    members: Vec<AttestorInfo>,
}

impl AttestorSet {
    /// Validate and sort `members`.
    ///
    /// # Errors
    /// Fails on an empty set, duplicate ids or addresses, or a zero weight.
    pub fn new(mut members: Vec<AttestorInfo>) -> Result<Self, PessimistClientError> {
        if members.is_empty() {
            return Err(invalid("attestor set is empty"));
        }
        if let Some(info) = members.iter().find(|info| info.weight == 0) {
            return Err(invalid(format!("attestor `{}` has zero weight", info.id)));
        }

        members.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(pair) = members.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(invalid(format!("duplicate attestor id `{}`", pair[0].id)));
        }

        let mut addresses: Vec<Address> = members.iter().map(|info| info.address).collect();
        addresses.sort_unstable();
        if let Some(pair) = addresses.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(invalid(format!("duplicate attestor address {}", pair[0])));
        }

        Ok(Self { members })
    }

    /// Look up an attestor by id.
    #[must_use]
    pub fn get(&self, id: &AttestorId) -> Option<&AttestorInfo> {
        self.members
            .binary_search_by(|info| info.id.cmp(id))
            .ok()
            .map(|index| &self.members[index])
    }

    /// Whether `id` is a member.
    #[must_use]
    pub fn contains(&self, id: &AttestorId) -> bool {
        self.get(id).is_some()
    }

    /// Members in id order.
    pub fn iter(&self) -> impl Iterator<Item = &AttestorInfo> {
        self.members.iter()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a validated set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of all member weights.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.members
            .iter()
            .fold(0u64, |acc, info| acc.saturating_add(info.weight))
    }
}

impl TryFrom<Vec<AttestorInfo>> for AttestorSet {
    type Error = PessimistClientError;

    fn try_from(members: Vec<AttestorInfo>) -> Result<Self, Self::Error> {
        Self::new(members)
    }
}

impl From<AttestorSet> for Vec<AttestorInfo> {
    fn from(set: AttestorSet) -> Self {
        set.members
    }
}

fn invalid(reason: impl Into<String>) -> PessimistClientError {
    PessimistClientError::InvalidAttestorSet {
        reason: reason.into(),
    }
}
