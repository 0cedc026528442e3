//! Shared plumbing for the Verarta bootstrap binaries
//!
//! Every binary takes the same `--config` and `--verbose` flags, installs the
//! same log subscriber and resolves settings the same way: file, then
//! `VERARTA_*` environment variables, then its own flags.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use verarta_core::config::DEFAULT_CONFIG_PATH;
use verarta_core::BootstrapSettings;

/// Flags common to all three tools
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Settings file; built-in defaults apply when it does not exist
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Install the log subscriber on stderr; stdout carries progress output
    pub fn init_logging(&self) {
        let level = if self.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Resolve settings, with `overrides` carrying the binary's own flags
    pub fn load_settings(
        &self,
        overrides: impl FnOnce(&mut BootstrapSettings),
    ) -> Result<BootstrapSettings> {
        BootstrapSettings::load_with(&self.config, overrides)
            .with_context(|| format!("loading settings from {}", self.config.display()))
    }
}

/// Set `target` when the flag was given
pub fn override_with<T>(target: &mut T, flag: Option<T>) {
    if let Some(value) = flag {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn config_defaults_to_the_well_known_path() {
        let cli = Cli::parse_from(["tool"]);
        assert_eq!(cli.common.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!cli.common.verbose);

        let cli = Cli::parse_from(["tool", "-v", "--config", "other.toml"]);
        assert_eq!(cli.common.config, PathBuf::from("other.toml"));
        assert!(cli.common.verbose);
    }

    #[test]
    fn flags_override_file_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrap.toml");
        std::fs::write(&path, "registry_path = \"from-file.json\"\n").unwrap();
        let common = CommonArgs {
            config: path,
            verbose: false,
        };

        let settings = common
            .load_settings(|s| override_with(&mut s.registry_path, Some("from-flag.json".into())))
            .unwrap();
        assert_eq!(settings.registry_path, PathBuf::from("from-flag.json"));

        let settings = common
            .load_settings(|s| override_with(&mut s.registry_path, None))
            .unwrap();
        assert_eq!(settings.registry_path, PathBuf::from("from-file.json"));
    }

    #[test]
    fn invalid_settings_carry_the_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrap.toml");
        std::fs::write(&path, "node_url = \"localhost\"\n").unwrap();
        let common = CommonArgs {
            config: path,
            verbose: false,
        };

        let err = common.load_settings(|_| {}).unwrap_err();
        assert!(format!("{err:#}").contains("bootstrap.toml"));
    }
}
