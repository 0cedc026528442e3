//! Account key generation
//!
//! Produces one key pair per configured producer and user through the
//! external key tool and assembles them into an [`AccountRegistry`]. The
//! registry is the only thing later steps read, so it is written in one
//! atomic step, and only after every key has been generated.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use verarta_core::{
    persist, AccountName, AccountRecord, AccountRegistry, BootstrapSettings, ChainEffects,
    ClientError, ConfigError, KeyPair, RegistryError,
};

/// Key generation failures
///
/// Nothing is written when any of these occur.
#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error("key generation for '{account}' failed: {source}")]
    KeyGeneration {
        account: AccountName,
        #[source]
        source: ClientError,
    },

    #[error("key tool returned public key {public_key} twice (second time for '{account}')")]
    DuplicateKey {
        account: AccountName,
        public_key: String,
    },

    #[error("cannot write the account registry to {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Settings(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Draws key pairs from the key tool, refusing to hand out a public key twice
pub struct KeyPairGenerator<'a, E: ChainEffects + ?Sized> {
    effects: &'a E,
    issued: BTreeSet<String>,
}

impl<'a, E: ChainEffects + ?Sized> KeyPairGenerator<'a, E> {
    pub fn new(effects: &'a E) -> Self {
        Self {
            effects,
            issued: BTreeSet::new(),
        }
    }

    /// Treat `public_key` as already handed out
    pub fn reserve(&mut self, public_key: impl Into<String>) {
        self.issued.insert(public_key.into());
    }

    /// Generate the key pair for `account`
    pub async fn generate(&mut self, account: &AccountName) -> Result<KeyPair, KeygenError> {
        let keys = self
            .effects
            .create_key()
            .await
            .map_err(|source| KeygenError::KeyGeneration {
                account: account.clone(),
                source,
            })?;

        if !self.issued.insert(keys.public.clone()) {
            return Err(KeygenError::DuplicateKey {
                account: account.clone(),
                public_key: keys.public,
            });
        }
        Ok(keys)
    }

    async fn record(&mut self, account: AccountName) -> Result<AccountRecord, KeygenError> {
        let keys = self.generate(&account).await?;
        tracing::info!(account = %account, public_key = %keys.public, "Generated key pair");
        Ok(AccountRecord::new(account, keys))
    }
}

/// Generate keys for every producer and user named by `settings`
///
/// Producers come first in configured order, then the core account, then the
/// numbered test users. The initial administrative key is taken from the
/// settings, not generated.
pub async fn generate_registry<E: ChainEffects + ?Sized>(
    effects: &E,
    settings: &BootstrapSettings,
) -> Result<AccountRegistry, KeygenError> {
    let producer_names = settings.keygen.producer_names()?;
    let user_names = settings.keygen.user_names()?;

    let mut generator = KeyPairGenerator::new(effects);
    generator.reserve(&settings.initial_key);

    let mut producers = Vec::with_capacity(producer_names.len());
    for name in producer_names {
        producers.push(generator.record(name).await?);
    }

    let mut users = Vec::with_capacity(user_names.len());
    for name in user_names {
        users.push(generator.record(name).await?);
    }

    Ok(AccountRegistry::new(
        settings.initial_key.clone(),
        producers,
        users,
    )?)
}

/// Generate the registry and save it to `settings.registry_path`
///
/// The destination is checked before the first key is requested, so an
/// unwritable path costs no key tool calls. Returns the registry and whether
/// an existing one was replaced.
pub async fn generate_registry_file<E: ChainEffects + ?Sized>(
    effects: &E,
    settings: &BootstrapSettings,
) -> Result<(AccountRegistry, bool), KeygenError> {
    let path = &settings.registry_path;
    persist::ensure_writable(path).map_err(|source| KeygenError::Destination {
        path: path.clone(),
        source,
    })?;

    let registry = generate_registry(effects, settings).await?;
    let replaced = write_registry(&registry, path)?;
    Ok((registry, replaced))
}

/// Persist `registry` to `path`, replacing whatever is there
///
/// Returns `true` when an existing registry was overwritten. The previous
/// keys are gone after this; accounts already created on a chain with them
/// can no longer be signed for.
pub fn write_registry(registry: &AccountRegistry, path: &Path) -> Result<bool, KeygenError> {
    let existed = path.exists();
    if existed {
        tracing::warn!(
            path = %path.display(),
            "Overwriting existing account registry; previously generated keys will be lost"
        );
    }
    registry.save(path)?;
    tracing::info!(
        path = %path.display(),
        producers = registry.producers.len(),
        users = registry.users.len(),
        "Saved account registry"
    );
    Ok(existed)
}
