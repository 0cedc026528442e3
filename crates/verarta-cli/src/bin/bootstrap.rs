//! Bring a fresh node up to a working testnet

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use verarta_bootstrap::{BootstrapOrchestrator, BootstrapState, ConsoleProgress};
use verarta_cli::{override_with, CommonArgs};
use verarta_effects::CleosHandler;

#[derive(Parser)]
#[command(name = "bootstrap")]
#[command(about = "Create the wallet, accounts, token and governance contracts on a fresh node", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Account registry to read
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Node RPC endpoint
    #[arg(long)]
    node_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.common.init_logging();

    let settings = cli.common.load_settings(|s| {
        override_with(&mut s.registry_path, cli.registry.clone());
        override_with(&mut s.node_url, cli.node_url.clone());
    })?;

    let cleos = CleosHandler::from_settings(&settings);
    let report = BootstrapOrchestrator::new(&cleos, &settings, ConsoleProgress::stdout())
        .run()
        .await;

    tracing::info!(
        state = %report.state,
        steps = report.steps.len(),
        applied = report.applied(),
        already_in_place = report.soft_skips().count(),
        "Bootstrap finished"
    );

    match report.state {
        BootstrapState::Completed => Ok(()),
        BootstrapState::Aborted { step, cause } => Err(anyhow::Error::new(cause)
            .context(format!("bootstrap aborted at step {step}/{}", report.total_steps))),
        state => Err(anyhow!("bootstrap stopped in non-terminal state {state}")),
    }
}
