//! Bootstrap configuration
//!
//! Settings come from three layers, later layers winning:
//! built-in defaults (a local development network), an optional TOML file,
//! and `VERARTA_*` environment variables. The merged result is validated
//! before any tool uses it.

use crate::account::{AccountName, AccountNameError};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Where the tools look for a settings file when none is given
pub const DEFAULT_CONFIG_PATH: &str = "blockchain/bootstrap.toml";

/// Well-known development key owning the system accounts
pub const DEV_INITIAL_PUBLIC_KEY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";
pub const DEV_INITIAL_PRIVATE_KEY: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

/// Digest of `PREACTIVATE_FEATURE`, scheduled through the producer API
pub const PREACTIVATE_FEATURE_DIGEST: &str =
    "0ec7e080177b2c02b278d5088611686b49d739925a92d9bfcacd7fc6b74053bd";

const ENV_PREFIX: &str = "VERARTA_";

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<AccountNameError> for ConfigError {
    fn from(err: AccountNameError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Everything the three bootstrap tools need to know about the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapSettings {
    /// Node RPC endpoint
    pub node_url: String,
    /// Wallet service endpoint
    pub wallet_url: String,
    /// Node command-line tool
    pub cleos: PathBuf,
    pub wallet_name: String,
    /// Where the password of a freshly created wallet is kept
    pub wallet_password_file: PathBuf,
    pub registry_path: PathBuf,
    /// Directory holding `<producer>.ini` node configs
    pub producer_config_dir: PathBuf,
    /// Account that creates every other account and issues the token
    pub admin_account: AccountName,
    pub initial_key: String,
    pub initial_private_key: String,
    pub system_accounts: Vec<AccountName>,
    pub keygen: KeygenSettings,
    pub token: TokenSettings,
    pub governance: GovernanceSettings,
}

/// Identity counts and naming for account generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeygenSettings {
    pub producers: usize,
    pub producer_prefix: String,
    /// Core application account, always the first user
    pub core_account: AccountName,
    pub test_users: usize,
    pub test_user_prefix: String,
}

/// Native token created in step 8
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenSettings {
    pub contract_account: AccountName,
    pub contract_dir: PathBuf,
    pub symbol: String,
    pub precision: u8,
    /// Whole units; also the amount issued
    pub max_supply: u64,
    pub issue_memo: String,
}

/// Protocol features, system contracts and producer registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GovernanceSettings {
    pub boot_contract_dir: PathBuf,
    pub system_contract_dir: PathBuf,
    pub preactivate_feature: String,
    /// Feature digests activated through the boot contract, in order
    pub features: Vec<String>,
    /// Pause after scheduling `PREACTIVATE_FEATURE`, so a block can include it
    pub preactivation_wait_ms: u64,
    pub system_version: u64,
    pub producer_url: String,
    pub producer_location: u16,
}

fn name(s: &str) -> AccountName {
    AccountName::new_unchecked(s)
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            node_url: "http://localhost:8888".to_string(),
            wallet_url: "http://localhost:6666".to_string(),
            cleos: PathBuf::from("cleos"),
            wallet_name: "default".to_string(),
            wallet_password_file: PathBuf::from("blockchain/wallet.pwd"),
            registry_path: PathBuf::from("blockchain/accounts.json"),
            producer_config_dir: PathBuf::from("blockchain/config"),
            admin_account: name("eosio"),
            initial_key: DEV_INITIAL_PUBLIC_KEY.to_string(),
            initial_private_key: DEV_INITIAL_PRIVATE_KEY.to_string(),
            system_accounts: [
                "eosio.bpay",
                "eosio.msig",
                "eosio.names",
                "eosio.ram",
                "eosio.ramfee",
                "eosio.saving",
                "eosio.stake",
                "eosio.token",
                "eosio.vpay",
                "eosio.rex",
                "eosio.fees",
                "eosio.reward",
            ]
            .into_iter()
            .map(name)
            .collect(),
            keygen: KeygenSettings::default(),
            token: TokenSettings::default(),
            governance: GovernanceSettings::default(),
        }
    }
}

impl Default for KeygenSettings {
    fn default() -> Self {
        Self {
            producers: 4,
            producer_prefix: "producer".to_string(),
            core_account: name("verartacore"),
            test_users: 3,
            test_user_prefix: "testuser".to_string(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            contract_account: name("eosio.token"),
            contract_dir: PathBuf::from("blockchain/contracts/eosio.token"),
            symbol: "SYS".to_string(),
            precision: 4,
            max_supply: 1_000_000_000,
            issue_memo: "Initial supply".to_string(),
        }
    }
}

impl Default for GovernanceSettings {
    fn default() -> Self {
        Self {
            boot_contract_dir: PathBuf::from("blockchain/contracts/eosio.boot"),
            system_contract_dir: PathBuf::from("blockchain/contracts/eosio.system"),
            preactivate_feature: PREACTIVATE_FEATURE_DIGEST.to_string(),
            features: [
                // ACTION_RETURN_VALUE
                "c3a6138c5061cf291310887c0b5c71fcaffeab90d5deb50d3b9e687cead45071",
                // CONFIGURABLE_WASM_LIMITS2
                "d528b9f6e9693f45ed277af93474fd473ce7d831dae2180cca35d907bd10cb40",
                // BLOCKCHAIN_PARAMETERS
                "5443fcf88330c586bc0e5f3dee10e7f63c76c00249c87fe4fbf7f38c082006b4",
                // GET_SENDER
                "f0af56d2c5a48d60a4a5b5c903edfb7db3a736a94ed589d0b797df33ff9d3e1d",
                // FORWARD_SETCODE
                "2652f5f96006294109b3dd0bbde63693f55324af452b799ee137a81a905eed25",
                // ONLY_BILL_FIRST_AUTHORIZER
                "8ba52fe7a3956c5cd3a656a3174b931d3bb2abb45578befc59f283ecd816a405",
                // RESTRICT_ACTION_TO_SELF
                "ad9e3d8f650687709fd68f4b90b41f7d825a365b02c23a636cef88ac2ac00c43",
                // DISALLOW_EMPTY_PRODUCER_SCHEDULE
                "68dcaa34c0517d19666e6b33add67351d8c5f69e999ca1e37931bc410a297428",
                // FIX_LINKAUTH_RESTRICTION
                "e0fb64b1085cc5538970158d05a009c24e276fb94e1a0bf6a528b48fbc4ff526",
                // REPLACE_DEFERRED
                "ef43112c6543b88db2283a2e077278c315ae2c84719a8b25f25cc88565fbea99",
                // NO_DUPLICATE_DEFERRED_ID
                "4a90c00d55454dc5b059055ca213579c6ea856967712a56017487886a4d4cc0f",
                // ONLY_LINK_TO_EXISTING_PERMISSION
                "1a99a59d87e06e09ec5b028a9cbb7749b4a5ad8819004365d02dc4379a8b7241",
                // RAM_RESTRICTIONS
                "4e7bf348da00a945489b2a681749eb56f5de00b900014e137ddae39f48f69d67",
                // WEBAUTHN_KEY
                "4fca8bd82bbd181e714e283f83e1b45d95ca5af40fb89ad3977b653c448f78c2",
                // WTMSIG_BLOCK_SIGNATURES
                "299dcb6af692324b899b39f16d5a530a33062804e41f09dc97e9f156b4476707",
                // CRYPTO_PRIMITIVES
                "6bcb40a24e49c26d0a60513b6aeb8551d264e4717f306b81a37a5afb3b47cedc",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            preactivation_wait_ms: 1_000,
            system_version: 0,
            producer_url: String::new(),
            producer_location: 0,
        }
    }
}

impl BootstrapSettings {
    /// Load settings from `path` (if it exists), then the process environment
    pub fn load(path: &Path) -> ConfigResult<Self> {
        Self::load_with(path, |_| {})
    }

    /// Like [`load`](Self::load), with `overrides` applied last
    ///
    /// Command-line flags go through `overrides` so they win over both the
    /// file and the environment, and are validated with everything else.
    pub fn load_with(path: &Path, overrides: impl FnOnce(&mut Self)) -> ConfigResult<Self> {
        let mut settings = Self::from_file_or_default(path)?;
        settings.apply_env_overrides(std::env::vars());
        overrides(&mut settings);
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a settings file; a missing file means "use the defaults"
    pub fn from_file_or_default(path: &Path) -> ConfigResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Overlay `VERARTA_*` variables onto the settings
    ///
    /// Takes the variables explicitly so tests need not touch the process
    /// environment.
    pub fn apply_env_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(key) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "NODE_URL" => self.node_url = value,
                "WALLET_URL" => self.wallet_url = value,
                "CLEOS" => self.cleos = PathBuf::from(value),
                "REGISTRY" => self.registry_path = PathBuf::from(value),
                _ => continue,
            }
            tracing::debug!(variable = key, "Applied {ENV_PREFIX} environment override");
        }
    }

    /// Reject settings no bootstrap run could succeed with
    pub fn validate(&self) -> ConfigResult<()> {
        for (label, url) in [("node_url", &self.node_url), ("wallet_url", &self.wallet_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{label} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.wallet_name.trim().is_empty() {
            return Err(ConfigError::Invalid("wallet_name is empty".into()));
        }
        if self.initial_key.trim().is_empty() || self.initial_private_key.trim().is_empty() {
            return Err(ConfigError::Invalid("initial key pair is incomplete".into()));
        }

        if self.keygen.producers == 0 {
            return Err(ConfigError::Invalid("at least one producer is required".into()));
        }
        self.keygen.producer_names()?;
        self.keygen.user_names()?;

        self.token.validate()?;

        for digest in std::iter::once(&self.governance.preactivate_feature)
            .chain(self.governance.features.iter())
        {
            validate_digest(digest)?;
        }
        Ok(())
    }
}

impl KeygenSettings {
    /// `producer1`, `producer2`, ...
    pub fn producer_names(&self) -> ConfigResult<Vec<AccountName>> {
        numbered_names(&self.producer_prefix, self.producers)
    }

    /// The core account followed by `testuser1`, `testuser2`, ...
    pub fn user_names(&self) -> ConfigResult<Vec<AccountName>> {
        let mut names = vec![self.core_account.clone()];
        names.extend(numbered_names(&self.test_user_prefix, self.test_users)?);
        Ok(names)
    }
}

fn numbered_names(prefix: &str, count: usize) -> ConfigResult<Vec<AccountName>> {
    (1..=count)
        .map(|i| {
            AccountName::new(format!("{prefix}{i}")).map_err(|e| {
                ConfigError::Invalid(format!(
                    "cannot name account #{i} with prefix '{prefix}': {e}"
                ))
            })
        })
        .collect()
}

impl TokenSettings {
    /// Largest precision the chain's asset type supports
    pub const MAX_PRECISION: u8 = 18;

    /// Largest raw amount (supply times 10^precision) an asset can carry
    pub const MAX_AMOUNT: u64 = (1 << 62) - 1;

    fn validate(&self) -> ConfigResult<()> {
        let symbol_ok = (1..=7).contains(&self.symbol.len())
            && self.symbol.chars().all(|c| c.is_ascii_uppercase());
        if !symbol_ok {
            return Err(ConfigError::Invalid(format!(
                "token symbol '{}' must be 1-7 uppercase letters",
                self.symbol
            )));
        }
        if self.precision > Self::MAX_PRECISION {
            return Err(ConfigError::Invalid(format!(
                "token precision {} exceeds {}",
                self.precision,
                Self::MAX_PRECISION
            )));
        }
        if self.max_supply == 0 {
            return Err(ConfigError::Invalid("token max_supply must be non-zero".into()));
        }
        let amount = 10u64
            .checked_pow(u32::from(self.precision))
            .and_then(|scale| self.max_supply.checked_mul(scale))
            .filter(|amount| *amount <= Self::MAX_AMOUNT);
        if amount.is_none() {
            return Err(ConfigError::Invalid(format!(
                "token supply {} does not fit the chain's asset amount limit",
                self.supply_asset()
            )));
        }
        Ok(())
    }

    /// The full supply as an asset string, e.g. `1000000000.0000 SYS`
    pub fn supply_asset(&self) -> String {
        if self.precision == 0 {
            format!("{} {}", self.max_supply, self.symbol)
        } else {
            format!(
                "{}.{} {}",
                self.max_supply,
                "0".repeat(usize::from(self.precision)),
                self.symbol
            )
        }
    }

    /// Symbol with precision, e.g. `4,SYS`
    pub fn core_symbol(&self) -> String {
        format!("{},{}", self.precision, self.symbol)
    }
}

fn validate_digest(digest: &str) -> ConfigResult<()> {
    match hex::decode(digest) {
        Ok(bytes) if bytes.len() == 32 => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "protocol feature digest '{digest}' is not 64 hex characters"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_a_local_devnet() {
        let settings = BootstrapSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.node_url, "http://localhost:8888");
        assert_eq!(settings.wallet_url, "http://localhost:6666");
        assert_eq!(settings.system_accounts.len(), 12);
        assert_eq!(settings.keygen.producer_names().unwrap().len(), 4);
        assert_eq!(
            settings
                .keygen
                .user_names()
                .unwrap()
                .iter()
                .map(AccountName::as_str)
                .collect::<Vec<_>>(),
            ["verartacore", "testuser1", "testuser2", "testuser3"]
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings =
            BootstrapSettings::from_file_or_default(&dir.path().join("bootstrap.toml")).unwrap();
        assert_eq!(settings, BootstrapSettings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrap.toml");
        std::fs::write(
            &path,
            r#"
node_url = "http://node:8888"

[keygen]
producers = 2

[token]
symbol = "VRT"
precision = 2
"#,
        )
        .unwrap();

        let settings = BootstrapSettings::from_file_or_default(&path).unwrap();
        assert_eq!(settings.node_url, "http://node:8888");
        assert_eq!(settings.wallet_url, "http://localhost:6666");
        assert_eq!(settings.keygen.producers, 2);
        assert_eq!(settings.keygen.test_users, 3);
        assert_eq!(settings.token.supply_asset(), "1000000000.00 VRT");
        assert_eq!(settings.token.core_symbol(), "2,VRT");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrap.toml");
        std::fs::write(&path, "node_uri = \"http://typo\"\n").unwrap();
        assert!(matches!(
            BootstrapSettings::from_file_or_default(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn environment_overrides_endpoints() {
        let mut settings = BootstrapSettings::default();
        settings.apply_env_overrides([
            ("VERARTA_NODE_URL".to_string(), "http://10.0.0.2:8888".to_string()),
            ("VERARTA_REGISTRY".to_string(), "/tmp/accounts.json".to_string()),
            ("NODE_URL".to_string(), "http://ignored".to_string()),
            ("VERARTA_UNKNOWN".to_string(), "ignored".to_string()),
        ]);
        assert_eq!(settings.node_url, "http://10.0.0.2:8888");
        assert_eq!(settings.registry_path, PathBuf::from("/tmp/accounts.json"));
    }

    #[test]
    fn default_asset_formatting() {
        let token = TokenSettings::default();
        assert_eq!(token.supply_asset(), "1000000000.0000 SYS");
        assert_eq!(token.core_symbol(), "4,SYS");

        let whole = TokenSettings {
            precision: 0,
            max_supply: 21,
            ..TokenSettings::default()
        };
        assert_eq!(whole.supply_asset(), "21 SYS");
    }

    #[test]
    fn validation_catches_unusable_settings() {
        let mut settings = BootstrapSettings::default();
        settings.keygen.producers = 6; // producer6 is outside the name alphabet
        assert!(settings.validate().is_err());

        let mut settings = BootstrapSettings::default();
        settings.keygen.producers = 0;
        assert!(settings.validate().is_err());

        let mut settings = BootstrapSettings::default();
        settings.node_url = "localhost:8888".into();
        assert!(settings.validate().is_err());

        let mut settings = BootstrapSettings::default();
        settings.token.symbol = "sys".into();
        assert!(settings.validate().is_err());

        let mut settings = BootstrapSettings::default();
        settings.governance.features.push("abc".into());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn token_supply_must_fit_an_asset_amount() {
        let mut token = TokenSettings {
            precision: 18,
            ..TokenSettings::default()
        };
        assert!(token.validate().is_err());

        // 4_611_686_018 * 10^9 is just under 2^62 - 1
        token.precision = 9;
        token.max_supply = 4_611_686_018;
        token.validate().unwrap();
        token.max_supply += 1;
        assert!(token.validate().is_err());

        TokenSettings::default().validate().unwrap();
    }

    #[test]
    fn overrides_are_applied_last_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrap.toml");
        std::fs::write(&path, "[keygen]\nproducers = 2\n").unwrap();

        let settings = BootstrapSettings::load_with(&path, |s| s.keygen.producers = 3).unwrap();
        assert_eq!(settings.keygen.producers, 3);

        let err = BootstrapSettings::load_with(&path, |s| s.keygen.producers = 0).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
