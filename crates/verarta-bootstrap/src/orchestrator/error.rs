//! Bootstrap run errors

use std::io;
use std::path::PathBuf;
use verarta_core::{ClientError, RegistryError};

/// Result type for bootstrap operations
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Errors that abort a bootstrap run
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Bootstrap was started before account generation
    #[error("account registry not found at {path}; run generate-accounts first")]
    RegistryNotFound { path: PathBuf },

    /// Registry exists but cannot be read or fails validation
    #[error(transparent)]
    InvalidRegistry(RegistryError),

    /// The node or wallet service rejected a call
    #[error("{subject}: {source}")]
    ExternalService {
        /// What the call was acting on, e.g. `producer1 account`
        subject: String,
        #[source]
        source: ClientError,
    },

    /// A local file the run depends on could not be read or written
    #[error("{action} {path}: {source}")]
    Persistence {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external call was reported as already satisfied in a step that
    /// does not accept that
    #[error("{subject}: unexpected '{reason}' in a step that makes no external calls")]
    UnexpectedOutcome { subject: String, reason: String },
}

impl From<RegistryError> for BootstrapError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { path } => Self::RegistryNotFound { path },
            other => Self::InvalidRegistry(other),
        }
    }
}

impl BootstrapError {
    pub(crate) fn external(subject: &str) -> impl FnOnce(ClientError) -> Self + '_ {
        move |source| Self::ExternalService {
            subject: subject.to_string(),
            source,
        }
    }
}
