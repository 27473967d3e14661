//! Defines the client interface for the prover server.
use clap::{command, Parser};

#[derive(Clone, Debug, Parser)]
#[command(
    name = "pessimist_prover",
    version,
    about = "Pessimist prover - collects inclusion proofs of packet commitments"
)]
/// The command line interface for the prover.
pub struct ProverCli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands for the prover.
#[derive(Clone, Debug, Parser)]
pub enum Commands {
    /// Run the prover server.
    Server(server::Args),
}

/// The arguments for the server subcommand.
pub mod server {
    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The TOML configuration file for the prover.
        #[clap(long)]
        pub config: String,
    }
}
