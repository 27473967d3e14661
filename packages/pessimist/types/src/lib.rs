#![doc = "Shared data model of the pessimistic attestation protocol"]
#![warn(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod claim;
pub mod codec;
pub mod merkle;
pub mod packet;
pub mod proof;
pub mod snapshot;

mod error;

pub use claim::{AttestorId, SignedPacketCommitmentsClaim};
pub use error::{ErrorCategory, TypesError};
pub use packet::PacketCommitment;
pub use proof::{MembershipProof, ProofBundle};
pub use snapshot::PacketCommitmentSnapshot;
