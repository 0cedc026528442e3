//! `cleos`-backed chain and wallet handler
//!
//! Each effect call becomes one `cleos` invocation. Node calls are pointed at
//! the node endpoint with `-u`, wallet calls at the wallet service with
//! `--wallet-url`. No timeout is applied; a hung call blocks the run until
//! the transport gives up or the operator stops the process.

use crate::classify;
use crate::output;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use verarta_core::{
    AccountName, ActionRequest, BootstrapSettings, CallOutcome, ChainEffects, ClientError,
    ClientResult, KeyPair, WalletEffects,
};

const REDACTED: &str = "<redacted>";

/// One `cleos` command line, with secret arguments marked for redaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
    secret: Vec<bool>,
}

impl Invocation {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            secret: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self.secret.push(false);
        self
    }

    fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self.secret.push(true);
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Renders as a shell-like command line with secrets replaced
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cleos")?;
        for (arg, secret) in self.args.iter().zip(&self.secret) {
            if *secret {
                write!(f, " {REDACTED}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Handler driving a node and wallet service through `cleos`
#[derive(Debug, Clone)]
pub struct CleosHandler {
    binary: PathBuf,
    node_url: String,
    wallet_url: String,
    http: reqwest::Client,
}

impl CleosHandler {
    pub fn new(
        binary: impl Into<PathBuf>,
        node_url: impl Into<String>,
        wallet_url: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            node_url: node_url.into().trim_end_matches('/').to_string(),
            wallet_url: wallet_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &BootstrapSettings) -> Self {
        Self::new(&settings.cleos, &settings.node_url, &settings.wallet_url)
    }

    fn node(&self) -> Invocation {
        Invocation::new().arg("-u").arg(&self.node_url)
    }

    fn wallet(&self) -> Invocation {
        Invocation::new().arg("--wallet-url").arg(&self.wallet_url)
    }

    /// Offline key generation needs neither endpoint
    pub fn create_key_invocation(&self) -> Invocation {
        Invocation::new().arg("create").arg("key").arg("--to-console")
    }

    pub fn create_wallet_invocation(&self, wallet: &str) -> Invocation {
        self.wallet()
            .arg("wallet")
            .arg("create")
            .arg("-n")
            .arg(wallet)
            .arg("--to-console")
    }

    pub fn unlock_wallet_invocation(&self, wallet: &str, password: &str) -> Invocation {
        self.wallet()
            .arg("wallet")
            .arg("unlock")
            .arg("-n")
            .arg(wallet)
            .arg("--password")
            .secret_arg(password)
    }

    pub fn import_key_invocation(&self, wallet: &str, private_key: &str) -> Invocation {
        self.wallet()
            .arg("wallet")
            .arg("import")
            .arg("-n")
            .arg(wallet)
            .arg("--private-key")
            .secret_arg(private_key)
    }

    pub fn create_account_invocation(
        &self,
        creator: &AccountName,
        name: &AccountName,
        owner_key: &str,
    ) -> Invocation {
        self.node()
            .arg("create")
            .arg("account")
            .arg(creator.as_str())
            .arg(name.as_str())
            .arg(owner_key)
    }

    pub fn set_contract_invocation(&self, account: &AccountName, contract_dir: &Path) -> Invocation {
        self.node()
            .arg("set")
            .arg("contract")
            .arg(account.as_str())
            .arg(contract_dir.display().to_string())
    }

    pub fn push_action_invocation(&self, request: &ActionRequest) -> Invocation {
        self.node()
            .arg("push")
            .arg("action")
            .arg(request.contract.as_str())
            .arg(&request.action)
            .arg(request.data.to_string())
            .arg("-p")
            .arg(request.authorization())
    }

    pub fn table_rows_invocation(
        &self,
        contract: &AccountName,
        scope: &str,
        table: &str,
    ) -> Invocation {
        self.node()
            .arg("get")
            .arg("table")
            .arg(contract.as_str())
            .arg(scope)
            .arg(table)
    }

    /// Run an invocation, mapping known "already satisfied" failures
    ///
    /// On success the payload is the command's stdout.
    async fn execute(&self, invocation: &Invocation) -> ClientResult<String> {
        tracing::debug!(command = %invocation, "Running");

        let output = Command::new(&self.binary)
            .args(invocation.args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ClientError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(CallOutcome::Applied(stdout));
        }

        // cleos writes errors to stderr, but some versions print them on stdout.
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = format!("{stderr}\n{stdout}");
        if let Some(reason) = classify::already_satisfied(&diagnostics) {
            tracing::debug!(command = %invocation, reason, "Already satisfied");
            return Ok(CallOutcome::already_satisfied(reason));
        }

        Err(ClientError::CommandFailed {
            command: invocation.to_string(),
            code: output.status.code(),
            stderr: diagnostics.trim().to_string(),
        })
    }

    fn feature_activation_url(&self) -> String {
        format!(
            "{}/v1/producer/schedule_protocol_feature_activations",
            self.node_url
        )
    }
}

#[async_trait]
impl ChainEffects for CleosHandler {
    async fn create_key(&self) -> Result<KeyPair, ClientError> {
        let invocation = self.create_key_invocation();
        let stdout = match self.execute(&invocation).await? {
            CallOutcome::Applied(stdout) => stdout,
            CallOutcome::AlreadySatisfied { reason } => {
                return Err(ClientError::MalformedOutput {
                    command: invocation.to_string(),
                    reason: format!("key generation reported '{reason}'"),
                })
            }
        };
        output::parse_key_pair(&stdout).map_err(|e| ClientError::MalformedOutput {
            command: invocation.to_string(),
            reason: e.to_string(),
        })
    }

    async fn create_account(
        &self,
        creator: &AccountName,
        name: &AccountName,
        owner_key: &str,
    ) -> ClientResult {
        let invocation = self.create_account_invocation(creator, name, owner_key);
        Ok(self.execute(&invocation).await?.map_unit())
    }

    async fn set_contract(&self, account: &AccountName, contract_dir: &Path) -> ClientResult {
        let invocation = self.set_contract_invocation(account, contract_dir);
        Ok(self.execute(&invocation).await?.map_unit())
    }

    async fn push_action(&self, request: &ActionRequest) -> ClientResult {
        let invocation = self.push_action_invocation(request);
        Ok(self.execute(&invocation).await?.map_unit())
    }

    async fn schedule_feature_activation(&self, digest: &str) -> ClientResult {
        let url = self.feature_activation_url();
        let body = serde_json::json!({ "protocol_features_to_activate": [digest] });
        tracing::debug!(%url, digest, "Scheduling protocol feature activation");

        let http_error = |message: String| ClientError::Http {
            url: url.clone(),
            message,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| http_error(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| http_error(e.to_string()))?;
        if status.is_success() {
            return Ok(CallOutcome::Applied(()));
        }
        if let Some(reason) = classify::already_satisfied(&text) {
            return Ok(CallOutcome::already_satisfied(reason));
        }
        Err(http_error(format!("{status}: {}", text.trim())))
    }

    async fn table_rows(
        &self,
        contract: &AccountName,
        scope: &str,
        table: &str,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        let invocation = self.table_rows_invocation(contract, scope, table);
        let malformed = |reason: String| ClientError::MalformedOutput {
            command: invocation.to_string(),
            reason,
        };
        match self.execute(&invocation).await? {
            CallOutcome::Applied(stdout) => {
                output::parse_table_rows(&stdout).map_err(|e| malformed(e.to_string()))
            }
            CallOutcome::AlreadySatisfied { reason } => {
                Err(malformed(format!("table query reported '{reason}'")))
            }
        }
    }
}

#[async_trait]
impl WalletEffects for CleosHandler {
    async fn create_wallet(&self, wallet: &str) -> ClientResult<String> {
        let invocation = self.create_wallet_invocation(wallet);
        match self.execute(&invocation).await? {
            CallOutcome::Applied(stdout) => output::parse_wallet_password(&stdout)
                .map(CallOutcome::Applied)
                .map_err(|e| ClientError::MalformedOutput {
                    command: invocation.to_string(),
                    reason: e.to_string(),
                }),
            CallOutcome::AlreadySatisfied { reason } => Ok(CallOutcome::AlreadySatisfied { reason }),
        }
    }

    async fn unlock_wallet(&self, wallet: &str, password: &str) -> ClientResult {
        let invocation = self.unlock_wallet_invocation(wallet, password);
        Ok(self.execute(&invocation).await?.map_unit())
    }

    async fn import_key(&self, wallet: &str, private_key: &str) -> ClientResult {
        let invocation = self.import_key_invocation(wallet, private_key);
        Ok(self.execute(&invocation).await?.map_unit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> CleosHandler {
        CleosHandler::new("cleos", "http://localhost:8888/", "http://localhost:6666")
    }

    fn name(s: &str) -> AccountName {
        AccountName::new(s).unwrap()
    }

    #[test]
    fn node_commands_target_the_node_endpoint() {
        let inv = handler().create_account_invocation(&name("eosio"), &name("producer1"), "PUB1");
        assert_eq!(
            inv.args(),
            ["-u", "http://localhost:8888", "create", "account", "eosio", "producer1", "PUB1"]
        );
    }

    #[test]
    fn wallet_commands_target_the_wallet_service() {
        let inv = handler().create_wallet_invocation("default");
        assert_eq!(
            inv.to_string(),
            "cleos --wallet-url http://localhost:6666 wallet create -n default --to-console"
        );
    }

    #[test]
    fn secrets_never_appear_in_rendered_commands() {
        let h = handler();
        let import = h.import_key_invocation("default", "5KSECRET");
        assert!(import.args().contains(&"5KSECRET".to_string()));
        assert!(!import.to_string().contains("5KSECRET"));
        assert!(import.to_string().ends_with("--private-key <redacted>"));

        let unlock = h.unlock_wallet_invocation("default", "PWSECRET");
        assert!(!unlock.to_string().contains("PWSECRET"));
    }

    #[test]
    fn push_action_serializes_data_and_authorization() {
        let request = ActionRequest::new(
            name("eosio.token"),
            "create",
            serde_json::json!(["eosio", "1000000000.0000 SYS"]),
            name("eosio.token"),
        );
        let inv = handler().push_action_invocation(&request);
        assert_eq!(
            &inv.args()[2..],
            [
                "push",
                "action",
                "eosio.token",
                "create",
                r#"["eosio","1000000000.0000 SYS"]"#,
                "-p",
                "eosio.token@active"
            ]
        );
    }

    #[test]
    fn set_contract_passes_the_directory() {
        let inv = handler()
            .set_contract_invocation(&name("eosio.token"), Path::new("contracts/eosio.token"));
        assert_eq!(
            &inv.args()[2..],
            ["set", "contract", "eosio.token", "contracts/eosio.token"]
        );
    }

    #[test]
    fn table_query_targets_the_node() {
        let inv = handler().table_rows_invocation(&name("eosio"), "eosio", "rammarket");
        assert_eq!(
            inv.to_string(),
            "cleos -u http://localhost:8888 get table eosio eosio rammarket"
        );
    }

    #[test]
    fn feature_url_has_no_double_slash() {
        assert_eq!(
            handler().feature_activation_url(),
            "http://localhost:8888/v1/producer/schedule_protocol_feature_activations"
        );
    }
}
