#![doc = "Attestor process: observes source chains, signs packet-commitment snapshots and serves the latest claims"]
#![warn(clippy::nursery, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod attestor;
pub mod claim_store;
pub mod cli;
pub mod coordinator;
pub mod metrics;
pub mod server;
pub mod signer;

mod error;

pub use error::{AttestorError, SignerError};
