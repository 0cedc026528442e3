//! Node-facing effects: key generation, accounts, contracts and actions

use super::{ClientError, ClientResult};
use crate::account::{AccountName, KeyPair};
use async_trait::async_trait;
use std::path::Path;

/// A contract action to push, authorized by `authorizer@permission`
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub contract: AccountName,
    pub action: String,
    pub data: serde_json::Value,
    pub authorizer: AccountName,
    pub permission: String,
}

impl ActionRequest {
    /// An action authorized by the `active` permission of `authorizer`
    pub fn new(
        contract: AccountName,
        action: impl Into<String>,
        data: serde_json::Value,
        authorizer: AccountName,
    ) -> Self {
        Self {
            contract,
            action: action.into(),
            data,
            authorizer,
            permission: "active".to_string(),
        }
    }

    /// `authorizer@permission`, as the node tooling expects it
    pub fn authorization(&self) -> String {
        format!("{}@{}", self.authorizer, self.permission)
    }
}

/// Operations against the node's RPC endpoint
#[async_trait]
pub trait ChainEffects: Send + Sync {
    /// Generate a fresh key pair with the node tooling's key generator
    ///
    /// Key material is never derived locally.
    async fn create_key(&self) -> Result<KeyPair, ClientError>;

    /// Create `name` under `creator`, with `owner_key` as owner and active key
    async fn create_account(
        &self,
        creator: &AccountName,
        name: &AccountName,
        owner_key: &str,
    ) -> ClientResult;

    /// Deploy the contract found in `contract_dir` to `account`
    async fn set_contract(&self, account: &AccountName, contract_dir: &Path) -> ClientResult;

    /// Push a single action in its own transaction
    async fn push_action(&self, request: &ActionRequest) -> ClientResult;

    /// Ask the producer plugin to activate a protocol feature at the next block
    async fn schedule_feature_activation(&self, digest: &str) -> ClientResult;

    /// Rows of `contract`'s `table` under `scope`; empty when the table has none
    async fn table_rows(
        &self,
        contract: &AccountName,
        scope: &str,
        table: &str,
    ) -> Result<Vec<serde_json::Value>, ClientError>;
}
