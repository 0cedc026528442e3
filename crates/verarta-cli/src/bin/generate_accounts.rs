//! Generate producer and user key pairs into the account registry

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use verarta_bootstrap::generate_registry_file;
use verarta_cli::{override_with, CommonArgs};
use verarta_effects::CleosHandler;

#[derive(Parser)]
#[command(name = "generate-accounts")]
#[command(about = "Generate key pairs for producers and users and save the account registry", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of producer accounts
    #[arg(long)]
    producers: Option<usize>,

    /// Number of numbered test users (the core account is always included)
    #[arg(long)]
    test_users: Option<usize>,

    /// Registry file to write
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.common.init_logging();

    let settings = cli.common.load_settings(|s| {
        override_with(&mut s.keygen.producers, cli.producers);
        override_with(&mut s.keygen.test_users, cli.test_users);
        override_with(&mut s.registry_path, cli.output.clone());
    })?;

    let cleos = CleosHandler::from_settings(&settings);
    let (registry, replaced) = generate_registry_file(&cleos, &settings)
        .await
        .context("account generation failed; nothing was written")?;

    println!("Producers:");
    for record in &registry.producers {
        println!("  ✓ {}: {}", record.name, record.public_key);
    }
    println!("Users:");
    for record in &registry.users {
        println!("  ✓ {}: {}", record.name, record.public_key);
    }

    let path = &settings.registry_path;
    if replaced {
        println!("Replaced existing registry at {}", path.display());
    } else {
        println!("Saved registry to {}", path.display());
    }
    tracing::info!(
        producers = registry.producers.len(),
        users = registry.users.len(),
        replaced,
        "Account generation finished"
    );
    Ok(())
}
