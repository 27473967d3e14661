#![doc = "Proof collector: gathers Merkle inclusion proofs of packet commitments independently of the attestors"]
#![warn(clippy::nursery, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod coordinator;
pub mod prover;
pub mod server;

mod error;

pub use error::ProverError;
