//! In-memory chain and wallet handler
//!
//! `MockChainHandler` keeps just enough state to answer the way a real node
//! and wallet would on a re-run: existing accounts, wallets and keys come back
//! as "already satisfied". Every call is recorded in order, and individual
//! calls can be scripted to fail.

use async_lock::Mutex;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use verarta_core::{
    AccountName, ActionRequest, CallOutcome, ChainEffects, ClientError, ClientResult, KeyPair,
    WalletEffects,
};

/// One call made against the mock, in the order it was made
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateKey,
    CreateWallet {
        wallet: String,
    },
    UnlockWallet {
        wallet: String,
    },
    ImportKey {
        wallet: String,
        private_key: String,
    },
    CreateAccount {
        creator: AccountName,
        name: AccountName,
        owner_key: String,
    },
    SetContract {
        account: AccountName,
        contract_dir: PathBuf,
    },
    PushAction(ActionRequest),
    ScheduleFeature {
        digest: String,
    },
    GetTable {
        contract: AccountName,
        scope: String,
        table: String,
    },
}

impl RecordedCall {
    /// Whether this call reached the node or wallet service
    ///
    /// Key generation is offline tooling and does not count.
    pub fn is_network_call(&self) -> bool {
        !matches!(self, Self::CreateKey)
    }
}

type FailurePredicate = Box<dyn Fn(&RecordedCall) -> bool + Send + Sync>;

struct FailureRule {
    matches: FailurePredicate,
    stderr: String,
}

#[derive(Debug, Default)]
struct Wallet {
    password: String,
    unlocked: bool,
    keys: BTreeSet<String>,
}

#[derive(Default)]
struct ChainState {
    calls: Vec<RecordedCall>,
    accounts: BTreeSet<AccountName>,
    wallets: BTreeMap<String, Wallet>,
    contracts: BTreeMap<AccountName, PathBuf>,
    applied_actions: Vec<ActionRequest>,
    scheduled_features: BTreeSet<String>,
    tables: BTreeMap<(AccountName, String, String), Vec<serde_json::Value>>,
    failures: Vec<FailureRule>,
    key_counter: u32,
    duplicate_keys: bool,
}

/// Mock node + wallet service
#[derive(Clone)]
pub struct MockChainHandler {
    state: Arc<Mutex<ChainState>>,
}

impl Default for MockChainHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainHandler {
    /// A fresh chain where only the administrative `eosio` account exists
    pub fn new() -> Self {
        let mut state = ChainState::default();
        state.accounts.insert(AccountName::new("eosio").unwrap());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn configure(&self, f: impl FnOnce(&mut ChainState)) {
        let mut state = self
            .state
            .try_lock()
            .expect("mock must be configured before it is shared");
        f(&mut state);
    }

    /// Pretend `name` was created by an earlier run
    pub fn with_existing_account(self, name: &str) -> Self {
        let name = AccountName::new(name).unwrap();
        self.configure(|s| {
            s.accounts.insert(name);
        });
        self
    }

    /// Pretend a locked wallet already exists
    pub fn with_existing_wallet(self, wallet: &str, password: &str) -> Self {
        self.configure(|s| {
            s.wallets.insert(
                wallet.to_string(),
                Wallet {
                    password: password.to_string(),
                    ..Wallet::default()
                },
            );
        });
        self
    }

    /// Make every matching call fail with `stderr`
    pub fn fail_when(
        self,
        matches: impl Fn(&RecordedCall) -> bool + Send + Sync + 'static,
        stderr: &str,
    ) -> Self {
        let rule = FailureRule {
            matches: Box::new(matches),
            stderr: stderr.to_string(),
        };
        self.configure(|s| s.failures.push(rule));
        self
    }

    /// Make key generation hand out the same pair every time
    pub fn with_repeating_keys(self) -> Self {
        self.configure(|s| s.duplicate_keys = true);
        self
    }

    /// Every call made so far, in order
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    /// Calls that reached the node or wallet service
    pub async fn network_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .await
            .into_iter()
            .filter(RecordedCall::is_network_call)
            .collect()
    }

    pub async fn accounts(&self) -> BTreeSet<AccountName> {
        self.state.lock().await.accounts.clone()
    }

    pub async fn has_account(&self, name: &str) -> bool {
        let name = AccountName::new(name).unwrap();
        self.state.lock().await.accounts.contains(&name)
    }

    pub async fn wallet_keys(&self, wallet: &str) -> BTreeSet<String> {
        self.state
            .lock()
            .await
            .wallets
            .get(wallet)
            .map(|w| w.keys.clone())
            .unwrap_or_default()
    }

    pub async fn contract(&self, account: &str) -> Option<PathBuf> {
        let account = AccountName::new(account).unwrap();
        self.state.lock().await.contracts.get(&account).cloned()
    }

    /// Actions the chain accepted, in order
    pub async fn applied_actions(&self) -> Vec<ActionRequest> {
        self.state.lock().await.applied_actions.clone()
    }

    pub async fn scheduled_features(&self) -> BTreeSet<String> {
        self.state.lock().await.scheduled_features.clone()
    }
}

fn failed(call: &RecordedCall, stderr: impl Into<String>) -> ClientError {
    ClientError::CommandFailed {
        command: format!("mock {call:?}"),
        code: Some(1),
        stderr: stderr.into(),
    }
}

impl ChainState {
    /// Record the call and apply any scripted failure
    fn record(&mut self, call: RecordedCall) -> Result<RecordedCall, ClientError> {
        self.calls.push(call.clone());
        match self.failures.iter().find(|rule| (rule.matches)(&call)) {
            Some(rule) => Err(failed(&call, rule.stderr.clone())),
            None => Ok(call),
        }
    }

    fn unlocked_wallet(&mut self, call: &RecordedCall, wallet: &str) -> Result<&mut Wallet, ClientError> {
        match self.wallets.get_mut(wallet) {
            None => Err(failed(call, format!("Error 3120002: Nonexistent wallet: {wallet}"))),
            Some(w) if !w.unlocked => Err(failed(call, "Error 3120003: Locked wallet")),
            Some(w) => Ok(w),
        }
    }
}

#[async_trait]
impl ChainEffects for MockChainHandler {
    async fn create_key(&self) -> Result<KeyPair, ClientError> {
        let mut state = self.state.lock().await;
        state.record(RecordedCall::CreateKey)?;
        if !state.duplicate_keys {
            state.key_counter += 1;
        }
        let n = state.key_counter;
        Ok(KeyPair::new(format!("EOS_MOCK_PUB_{n}"), format!("5K_MOCK_PVT_{n}")))
    }

    async fn create_account(
        &self,
        creator: &AccountName,
        name: &AccountName,
        owner_key: &str,
    ) -> ClientResult {
        let mut state = self.state.lock().await;
        let call = state.record(RecordedCall::CreateAccount {
            creator: creator.clone(),
            name: name.clone(),
            owner_key: owner_key.to_string(),
        })?;
        if !state.accounts.contains(creator) {
            return Err(failed(&call, format!("Error 3010001: Unknown creator {creator}")));
        }
        if !state.accounts.insert(name.clone()) {
            return Ok(CallOutcome::already_satisfied("account already exists"));
        }
        Ok(CallOutcome::Applied(()))
    }

    async fn set_contract(&self, account: &AccountName, contract_dir: &Path) -> ClientResult {
        let mut state = self.state.lock().await;
        let call = state.record(RecordedCall::SetContract {
            account: account.clone(),
            contract_dir: contract_dir.to_path_buf(),
        })?;
        if !state.accounts.contains(account) {
            return Err(failed(&call, format!("Error 3010001: Unknown account {account}")));
        }
        if state.contracts.get(account).map(PathBuf::as_path) == Some(contract_dir) {
            return Ok(CallOutcome::already_satisfied("contract code already deployed"));
        }
        state
            .contracts
            .insert(account.clone(), contract_dir.to_path_buf());
        Ok(CallOutcome::Applied(()))
    }

    async fn push_action(&self, request: &ActionRequest) -> ClientResult {
        let mut state = self.state.lock().await;
        let call = state.record(RecordedCall::PushAction(request.clone()))?;
        if !state.contracts.contains_key(&request.contract) {
            return Err(failed(
                &call,
                format!("Error 3160010: No contract deployed to {}", request.contract),
            ));
        }
        if state.applied_actions.contains(request) {
            return Ok(CallOutcome::already_satisfied("action already applied"));
        }
        if request.action == "init" {
            // the system contract seeds its RAM market on init
            let key = (
                request.contract.clone(),
                request.contract.to_string(),
                "rammarket".to_string(),
            );
            state
                .tables
                .entry(key)
                .or_default()
                .push(serde_json::json!({ "supply": "10000000000.0000 RAMCORE" }));
        }
        state.applied_actions.push(request.clone());
        Ok(CallOutcome::Applied(()))
    }

    async fn schedule_feature_activation(&self, digest: &str) -> ClientResult {
        let mut state = self.state.lock().await;
        state.record(RecordedCall::ScheduleFeature {
            digest: digest.to_string(),
        })?;
        if !state.scheduled_features.insert(digest.to_string()) {
            return Ok(CallOutcome::already_satisfied("protocol feature already scheduled"));
        }
        Ok(CallOutcome::Applied(()))
    }

    async fn table_rows(
        &self,
        contract: &AccountName,
        scope: &str,
        table: &str,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        let mut state = self.state.lock().await;
        state.record(RecordedCall::GetTable {
            contract: contract.clone(),
            scope: scope.to_string(),
            table: table.to_string(),
        })?;
        let key = (contract.clone(), scope.to_string(), table.to_string());
        Ok(state.tables.get(&key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl WalletEffects for MockChainHandler {
    async fn create_wallet(&self, wallet: &str) -> ClientResult<String> {
        let mut state = self.state.lock().await;
        state.record(RecordedCall::CreateWallet {
            wallet: wallet.to_string(),
        })?;
        if state.wallets.contains_key(wallet) {
            return Ok(CallOutcome::already_satisfied("wallet already exists"));
        }
        let password = format!("PW_MOCK_{wallet}");
        state.wallets.insert(
            wallet.to_string(),
            Wallet {
                password: password.clone(),
                unlocked: true,
                keys: BTreeSet::new(),
            },
        );
        Ok(CallOutcome::Applied(password))
    }

    async fn unlock_wallet(&self, wallet: &str, password: &str) -> ClientResult {
        let mut state = self.state.lock().await;
        let call = state.record(RecordedCall::UnlockWallet {
            wallet: wallet.to_string(),
        })?;
        let Some(w) = state.wallets.get_mut(wallet) else {
            return Err(failed(&call, format!("Error 3120002: Nonexistent wallet: {wallet}")));
        };
        if w.password != password {
            return Err(failed(&call, "Error 3120005: Invalid wallet password"));
        }
        if w.unlocked {
            return Ok(CallOutcome::already_satisfied("wallet already unlocked"));
        }
        w.unlocked = true;
        Ok(CallOutcome::Applied(()))
    }

    async fn import_key(&self, wallet: &str, private_key: &str) -> ClientResult {
        let mut state = self.state.lock().await;
        let call = state.record(RecordedCall::ImportKey {
            wallet: wallet.to_string(),
            private_key: private_key.to_string(),
        })?;
        let w = state.unlocked_wallet(&call, wallet)?;
        if !w.keys.insert(private_key.to_string()) {
            return Ok(CallOutcome::already_satisfied("key already in wallet"));
        }
        Ok(CallOutcome::Applied(()))
    }
}
