use std::{fs, path::PathBuf};

use alloy_signer_local::PrivateKeySigner;
use anyhow::Context;
use clap::Parser;
use pessimist_attestor::cli::{
    attestor_dir,
    key::{KeyCommands, KeystoreArgs},
    AttestorCli, AttestorConfig, Commands, DEFAULT_KEYSTORE_NAME,
};
use pessimist_keys::keystore::{read_keystore, write_keystore};

fn keystore_path(args: &KeystoreArgs) -> anyhow::Result<PathBuf> {
    match &args.keystore {
        Some(path) => Ok(path.clone()),
        None => Ok(attestor_dir()?.join(DEFAULT_KEYSTORE_NAME)),
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = AttestorCli::parse();

    match cli.command {
        Commands::Server(args) => {
            let config = AttestorConfig::from_file(&args.config)
                .with_context(|| format!("loading config `{}`", args.config))?;
            pessimist_attestor::server::run(config).await?;
        }
        Commands::Key(KeyCommands::Generate(args)) => {
            let keystore_path = keystore_path(&args)?;
            if keystore_path.exists() {
                anyhow::bail!("key pair already found at {}; aborting", keystore_path.display());
            }
            let dir = keystore_path
                .parent()
                .context("keystore path has no parent directory")?;
            let name = keystore_path
                .file_name()
                .and_then(|name| name.to_str())
                .context("keystore path has no file name")?;
            fs::create_dir_all(dir).context("creating keystore directory")?;

            let signer = PrivateKeySigner::random();
            let path = write_keystore(dir, name, "", &signer).context("unable to generate key")?;
            println!("key successfully saved to {}", path.display());
            println!("address: {}", signer.address());
        }
        Commands::Key(KeyCommands::Show(args)) => {
            let keystore_path = keystore_path(&args.keystore)?;
            let signer = read_keystore(&keystore_path, "")
                .with_context(|| format!("reading keystore {}", keystore_path.display()))?;

            if !args.hide_private {
                println!("{}", hex::encode(signer.credential().to_bytes().as_slice()));
            }
            if !args.hide_public {
                println!("{}", signer.address());
            }
        }
    }
    Ok(())
}
