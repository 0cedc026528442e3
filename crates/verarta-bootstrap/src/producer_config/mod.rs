//! Producer node config synchronization
//!
//! Writes each producer's signing key from the [`AccountRegistry`] into
//! `<config_dir>/<producer>.ini` as
//! `signature-provider = <public>=KEY:<private>`. Producers without a config
//! file, or whose file has no `signature-provider` line, are skipped with a
//! warning; the tool never invents a line because it cannot know where in
//! the file it belongs.

mod editor;

pub use editor::{ConfigDocument, SetOutcome};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use verarta_core::{persist, AccountName, AccountRecord, AccountRegistry};

/// Config key carrying a producer's block signing key
pub const SIGNATURE_PROVIDER_KEY: &str = "signature-provider";

/// Fatal synchronization errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to read producer config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write producer config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Conditions that skip or qualify one producer without stopping the sync
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncWarning {
    #[error("no config file for {producer} at {path}")]
    ConfigNotFound { producer: AccountName, path: PathBuf },

    #[error("{path} has no signature-provider line; left unmodified")]
    SignatureProviderMissing { producer: AccountName, path: PathBuf },

    #[error("{path} has {extra} further signature-provider line(s); only the first was updated")]
    DuplicateSignatureProvider {
        producer: AccountName,
        path: PathBuf,
        extra: usize,
    },
}

/// What happened to every producer in one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub updated: Vec<AccountName>,
    pub unchanged: Vec<AccountName>,
    pub warnings: Vec<SyncWarning>,
}

impl SyncReport {
    /// Producers whose file now carries their key
    pub fn synchronized(&self) -> usize {
        self.updated.len() + self.unchanged.len()
    }
}

/// Canonical value written after `signature-provider =`
pub fn signature_provider_value(record: &AccountRecord) -> String {
    format!("{}=KEY:{}", record.public_key, record.private_key)
}

/// Applies registry keys to a directory of producer configs
#[derive(Debug, Clone)]
pub struct ConfigSynchronizer {
    config_dir: PathBuf,
}

impl ConfigSynchronizer {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_path(&self, producer: &AccountName) -> PathBuf {
        self.config_dir.join(format!("{producer}.ini"))
    }

    /// Synchronize every producer in registry order
    ///
    /// Stops at the first read or write failure; files already written stay
    /// written.
    pub fn sync(&self, registry: &AccountRegistry) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        for producer in &registry.producers {
            self.sync_producer(producer, &mut report)?;
        }
        Ok(report)
    }

    fn sync_producer(
        &self,
        producer: &AccountRecord,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let path = self.config_path(&producer.name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                let warning = SyncWarning::ConfigNotFound {
                    producer: producer.name.clone(),
                    path,
                };
                tracing::warn!(producer = %producer.name, "{warning}");
                report.warnings.push(warning);
                return Ok(());
            }
            Err(source) => return Err(SyncError::Read { path, source }),
        };

        let mut document = ConfigDocument::parse(&content);
        let outcome =
            document.set_first(SIGNATURE_PROVIDER_KEY, &signature_provider_value(producer));

        if outcome.duplicates() > 0 {
            let warning = SyncWarning::DuplicateSignatureProvider {
                producer: producer.name.clone(),
                path: path.clone(),
                extra: outcome.duplicates(),
            };
            tracing::warn!(producer = %producer.name, "{warning}");
            report.warnings.push(warning);
        }

        match outcome {
            SetOutcome::Missing => {
                let warning = SyncWarning::SignatureProviderMissing {
                    producer: producer.name.clone(),
                    path,
                };
                tracing::warn!(producer = %producer.name, "{warning}");
                report.warnings.push(warning);
            }
            SetOutcome::Unchanged { .. } => {
                tracing::info!(producer = %producer.name, "Signing key already current");
                report.unchanged.push(producer.name.clone());
            }
            SetOutcome::Replaced { line, .. } => {
                write_preserving_permissions(&path, document.to_string().as_bytes())?;
                tracing::info!(
                    producer = %producer.name,
                    path = %path.display(),
                    line = line + 1,
                    "Updated signing key"
                );
                report.updated.push(producer.name.clone());
            }
        }
        Ok(())
    }
}

/// Atomically replace the file behind `path`, keeping its mode
///
/// A symlinked config is resolved first so the link itself survives.
fn write_preserving_permissions(path: &Path, contents: &[u8]) -> Result<(), SyncError> {
    let write_error = |source| SyncError::Write {
        path: path.to_path_buf(),
        source,
    };
    let target = fs::canonicalize(path).map_err(write_error)?;
    let permissions = fs::metadata(&target).map_err(write_error)?.permissions();
    persist::write_atomic(&target, contents, Some(permissions)).map_err(write_error)
}
