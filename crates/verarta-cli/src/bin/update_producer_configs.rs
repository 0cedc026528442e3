//! Write each producer's signing key into its node config file

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use verarta_bootstrap::ConfigSynchronizer;
use verarta_cli::{override_with, CommonArgs};
use verarta_core::AccountRegistry;

#[derive(Parser)]
#[command(name = "update-producer-configs")]
#[command(about = "Set signature-provider in every producer config from the account registry", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Account registry to read
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Directory holding `<producer>.ini` files
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.common.init_logging();

    let settings = cli.common.load_settings(|s| {
        override_with(&mut s.registry_path, cli.registry.clone());
        override_with(&mut s.producer_config_dir, cli.config_dir.clone());
    })?;

    let registry = AccountRegistry::load(&settings.registry_path)?;
    let synchronizer = ConfigSynchronizer::new(&settings.producer_config_dir);
    let report = synchronizer
        .sync(&registry)
        .context("producer config update stopped")?;

    for name in &report.updated {
        println!("  ✓ {name}: updated {}", synchronizer.config_path(name).display());
    }
    for name in &report.unchanged {
        println!("  ✓ {name}: already current");
    }
    for warning in &report.warnings {
        println!("  ! {warning}");
    }
    tracing::info!(
        updated = report.updated.len(),
        unchanged = report.unchanged.len(),
        warnings = report.warnings.len(),
        "Producer config update finished"
    );
    println!(
        "{} of {} producer configs carry their signing key",
        report.synchronized(),
        registry.producers.len()
    );
    Ok(())
}
