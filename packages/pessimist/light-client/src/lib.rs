#![doc = "Pessimistic light client: trusts packet-commitment roots attested by a quorum of attestors"]
#![warn(clippy::nursery, clippy::pedantic, missing_docs)]
#![cfg_attr(test, allow(clippy::too_many_lines))]

pub mod aggregate;
pub mod attestor_set;
pub mod client;
pub mod client_state;
pub mod consensus_state;
pub mod error;
pub mod membership;
pub mod misbehaviour;
pub mod module;
pub mod quorum;
pub mod store;
pub mod update;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{PessimisticClient, UpdateOutcome};
pub use error::PessimistClientError;
