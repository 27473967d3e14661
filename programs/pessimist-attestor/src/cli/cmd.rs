//! Defines the client interface for the attestor server.
use clap::{command, Parser};

#[derive(Clone, Debug, Parser)]
#[command(
    name = "pessimist_attestor",
    version,
    about = "Pessimist attestor - signs packet-commitment snapshots of source chains",
    long_about = "Observes configured source chains, signs their packet-commitment roots and serves the claims over HTTP.\nAlso manages the attestor's signing key."
)]
/// The command line interface for the attestor.
pub struct AttestorCli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands for the attestor.
#[derive(Clone, Debug, Parser)]
pub enum Commands {
    /// Run the attestor server.
    Server(server::Args),

    /// Manage the attestor signing key.
    #[command(subcommand)]
    Key(key::KeyCommands),
}

/// The arguments for the server subcommand.
pub mod server {
    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub struct Args {
        /// The TOML configuration file for the attestor.
        #[clap(long)]
        pub config: String,
    }
}

/// The arguments for the key subcommands.
pub mod key {
    use std::path::PathBuf;

    use super::Parser;

    #[derive(Clone, Debug, Parser)]
    pub enum KeyCommands {
        /// Generate a new key into the keystore.
        Generate(KeystoreArgs),
        /// Print the key held in the keystore.
        Show(ShowArgs),
    }

    #[derive(Clone, Debug, Parser)]
    pub struct KeystoreArgs {
        /// Keystore file; defaults to `~/.pessimist-attestor/attestor.json`.
        #[clap(long)]
        pub keystore: Option<PathBuf>,
    }

    #[derive(Clone, Debug, Parser)]
    pub struct ShowArgs {
        #[clap(flatten)]
        pub keystore: KeystoreArgs,
        #[clap(long)]
        pub hide_private: bool,
        #[clap(long)]
        pub hide_public: bool,
    }
}
