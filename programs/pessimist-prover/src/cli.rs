//! Command line interface and configuration of the prover.

mod cmd;
mod config;

pub use cmd::*;
pub use config::*;
