//! Registry and producer-config fixtures

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use verarta_core::config::DEV_INITIAL_PUBLIC_KEY;
use verarta_core::{AccountName, AccountRecord, AccountRegistry, KeyPair};

/// Record `name` with keys `PUB<n>` / `PVT<n>`
pub fn record(name: &str, n: usize) -> AccountRecord {
    AccountRecord::new(
        AccountName::new(name).unwrap(),
        KeyPair::new(format!("PUB{n}"), format!("PVT{n}")),
    )
}

/// `producer1..=producers` and `testuser1..=users`, numbered keys throughout
pub fn registry(producers: usize, users: usize) -> AccountRegistry {
    let producer_records = (1..=producers)
        .map(|i| record(&format!("producer{i}"), i))
        .collect();
    let user_records = (1..=users)
        .map(|i| record(&format!("testuser{i}"), producers + i))
        .collect();
    AccountRegistry::new(DEV_INITIAL_PUBLIC_KEY, producer_records, user_records).unwrap()
}

/// A temporary directory of `<producer>.ini` files
pub struct ProducerConfigDir {
    dir: TempDir,
}

impl ProducerConfigDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self, producer: &str) -> PathBuf {
        self.dir.path().join(format!("{producer}.ini"))
    }

    pub fn write(&self, producer: &str, content: &str) -> PathBuf {
        let path = self.config_path(producer);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, producer: &str) -> String {
        std::fs::read_to_string(self.config_path(producer)).unwrap()
    }
}

impl Default for ProducerConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

/// A typical producer node config with a placeholder signing key
pub fn producer_ini(producer: &str) -> String {
    format!(
        "# {producer} node configuration\n\
         agent-name = {producer}\n\
         producer-name = {producer}\n\
         plugin = eosio::producer_plugin\n\
         plugin = eosio::chain_api_plugin\n\
         signature-provider = EOS_PLACEHOLDER=KEY:5K_PLACEHOLDER\n\
         p2p-peer-address = producer2:9876\n\
         http-server-address = 0.0.0.0:8888\n"
    )
}
