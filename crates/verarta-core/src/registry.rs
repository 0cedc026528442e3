//! Account registry
//!
//! The registry is the single record of every generated identity: the
//! administrative key, the producer accounts and the application/user
//! accounts. It is written once by key generation and is read-only for the
//! rest of a bootstrap run.

use crate::account::{AccountName, AccountRecord};
use crate::persist;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry loading, validation and persistence errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("account registry not found at {path} (run account generation first)")]
    NotFound { path: PathBuf },

    #[error("failed to read account registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("account registry {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid account registry: {reason}")]
    Invalid { reason: String },

    #[error("failed to write account registry {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegistryError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// All identities generated for one network instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRegistry {
    /// Public half of the administrative key owning the system accounts
    pub initial_key: String,
    pub producers: Vec<AccountRecord>,
    pub users: Vec<AccountRecord>,
}

impl AccountRegistry {
    /// Assemble a registry, rejecting it if it breaks any registry invariant
    pub fn new(
        initial_key: impl Into<String>,
        producers: Vec<AccountRecord>,
        users: Vec<AccountRecord>,
    ) -> RegistryResult<Self> {
        let registry = Self {
            initial_key: initial_key.into(),
            producers,
            users,
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Check the invariants every consumer relies on
    ///
    /// Names are already grammar-checked by [`AccountName`]; this checks the
    /// cross-record properties.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.initial_key.trim().is_empty() {
            return Err(RegistryError::invalid("initial key is empty"));
        }
        if self.producers.is_empty() {
            return Err(RegistryError::invalid("registry has no producers"));
        }

        let mut seen = BTreeSet::new();
        for record in self.all_accounts() {
            if !seen.insert(&record.name) {
                return Err(RegistryError::invalid(format!(
                    "account name '{}' appears more than once",
                    record.name
                )));
            }
            if record.public_key.is_empty() || record.private_key.is_empty() {
                return Err(RegistryError::invalid(format!(
                    "account '{}' is missing a key",
                    record.name
                )));
            }
        }
        Ok(())
    }

    /// Producers first, then users, in registry order
    pub fn all_accounts(&self) -> impl Iterator<Item = &AccountRecord> {
        self.producers.iter().chain(self.users.iter())
    }

    pub fn producer(&self, name: &AccountName) -> Option<&AccountRecord> {
        self.producers.iter().find(|p| &p.name == name)
    }

    /// Read and validate a registry file
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                RegistryError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RegistryError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let registry: Self =
            serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        registry.validate()?;
        Ok(registry)
    }

    /// Atomically write the registry as pretty JSON, owner-readable only
    pub fn save(&self, path: &Path) -> RegistryResult<()> {
        self.validate()?;
        let mut json =
            serde_json::to_vec_pretty(self).map_err(|e| RegistryError::invalid(e.to_string()))?;
        json.push(b'\n');

        persist::write_secret(path, &json).map_err(|source| RegistryError::Persistence {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            accounts = self.producers.len() + self.users.len(),
            "Wrote account registry"
        );
        Ok(())
    }
}
