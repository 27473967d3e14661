//! Command line interface and configuration of the attestor.

mod cmd;
mod config;

pub use cmd::*;
pub use config::*;
