use anyhow::Context;
use clap::Parser;
use pessimist_prover::cli::{Commands, ProverCli, ProverConfig};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = ProverCli::parse();

    match cli.command {
        Commands::Server(args) => {
            let config = ProverConfig::from_file(&args.config)
                .with_context(|| format!("loading config `{}`", args.config))?;
            pessimist_prover::server::run(config).await
        }
    }
}
