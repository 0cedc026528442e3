//! What each [`StepAction`] does against the node and wallet

use super::{
    BootstrapError, BootstrapOrchestrator, BootstrapResult, ProgressReporter, StepAction, StepRun,
};
use serde_json::json;
use std::io;
use std::path::Path;
use std::time::Duration;
use verarta_core::{
    persist, AccountName, AccountRecord, AccountRegistry, ActionRequest, CallOutcome,
    ChainEffects, WalletEffects,
};

impl<'a, E, P> BootstrapOrchestrator<'a, E, P>
where
    E: ChainEffects + WalletEffects + ?Sized,
    P: ProgressReporter,
{
    pub(super) async fn execute(
        &mut self,
        registry: &AccountRegistry,
        run: &mut StepRun,
    ) -> BootstrapResult<()> {
        let settings = self.settings;
        match run.step.action {
            StepAction::CreateWallet => self.create_wallet(run).await,
            StepAction::LoadRegistry => {
                let message = format!(
                    "Loaded {} producers and {} users from {}",
                    registry.producers.len(),
                    registry.users.len(),
                    settings.registry_path.display()
                );
                self.note(run, &message);
                Ok(())
            }
            StepAction::ImportKeys => self.import_keys(registry, run).await,
            StepAction::CreateSystemAccounts => {
                for account in &settings.system_accounts {
                    self.create_account(run, account, &registry.initial_key)
                        .await?;
                }
                Ok(())
            }
            StepAction::CreateProducerAccounts => {
                self.create_accounts(run, &registry.producers).await
            }
            StepAction::CreateUserAccounts => self.create_accounts(run, &registry.users).await,
            StepAction::DeployTokenContract => {
                let token = &settings.token;
                self.set_contract(run, &token.contract_account, &token.contract_dir)
                    .await
            }
            StepAction::IssueNativeToken => self.issue_native_token(run).await,
            StepAction::ActivateFeatures => self.activate_features(run).await,
            StepAction::RegisterProducers => self.register_producers(registry, run).await,
        }
    }

    async fn create_wallet(&mut self, run: &mut StepRun) -> BootstrapResult<()> {
        let settings = self.settings;
        let wallet = settings.wallet_name.as_str();
        let path = &settings.wallet_password_file;
        if !path.exists() {
            prepare_password_file(path)?;
        }

        let subject = format!("wallet '{wallet}'");
        let outcome = self
            .effects
            .create_wallet(wallet)
            .await
            .map_err(BootstrapError::external(&subject))?;

        match self.settle(run, &subject, outcome)? {
            Some(password) => {
                if let Err(err) = save_wallet_password(path, &password) {
                    // Kept out of the logs; the transcript is the only copy left.
                    self.progress.note(
                        &run.step,
                        &format!("Wallet password NOT saved, record it now: {password}"),
                    );
                    return Err(err);
                }
                let message = format!("Wallet password saved to {}", path.display());
                self.note(run, &message);
                Ok(())
            }
            None => self.unlock_wallet(run).await,
        }
    }

    /// Unlock an existing wallet with the password saved when it was created
    async fn unlock_wallet(&mut self, run: &mut StepRun) -> BootstrapResult<()> {
        let settings = self.settings;
        let wallet = settings.wallet_name.as_str();
        let path = &settings.wallet_password_file;
        let password = match std::fs::read_to_string(path) {
            Ok(password) => password,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let message = format!(
                    "No saved password at {}; the wallet must already be unlocked",
                    path.display()
                );
                self.note(run, &message);
                return Ok(());
            }
            Err(source) => {
                return Err(BootstrapError::Persistence {
                    action: "failed to read wallet password from",
                    path: path.clone(),
                    source,
                })
            }
        };

        let subject = format!("unlock wallet '{wallet}'");
        let outcome = self
            .effects
            .unlock_wallet(wallet, password.trim())
            .await
            .map_err(BootstrapError::external(&subject))?;
        self.settle(run, &subject, outcome)?;
        Ok(())
    }

    async fn import_keys(
        &mut self,
        registry: &AccountRegistry,
        run: &mut StepRun,
    ) -> BootstrapResult<()> {
        let settings = self.settings;
        self.import_key(run, "initial key", &settings.initial_private_key)
            .await?;
        for record in registry.all_accounts() {
            let subject = format!("{} key", record.name);
            self.import_key(run, &subject, &record.private_key).await?;
        }
        Ok(())
    }

    async fn import_key(
        &mut self,
        run: &mut StepRun,
        subject: &str,
        private_key: &str,
    ) -> BootstrapResult<()> {
        let settings = self.settings;
        let outcome = self
            .effects
            .import_key(&settings.wallet_name, private_key)
            .await
            .map_err(BootstrapError::external(subject))?;
        self.settle(run, subject, outcome)?;
        Ok(())
    }

    async fn create_accounts(
        &mut self,
        run: &mut StepRun,
        records: &[AccountRecord],
    ) -> BootstrapResult<()> {
        for record in records {
            self.create_account(run, &record.name, &record.public_key)
                .await?;
        }
        Ok(())
    }

    async fn create_account(
        &mut self,
        run: &mut StepRun,
        name: &AccountName,
        owner_key: &str,
    ) -> BootstrapResult<()> {
        let settings = self.settings;
        let subject = format!("{name} account");
        let outcome = self
            .effects
            .create_account(&settings.admin_account, name, owner_key)
            .await
            .map_err(BootstrapError::external(&subject))?;
        self.settle(run, &subject, outcome)?;
        Ok(())
    }

    async fn set_contract(
        &mut self,
        run: &mut StepRun,
        account: &AccountName,
        contract_dir: &Path,
    ) -> BootstrapResult<()> {
        let subject = format!("contract {} on {account}", contract_dir.display());
        let outcome = self
            .effects
            .set_contract(account, contract_dir)
            .await
            .map_err(BootstrapError::external(&subject))?;
        self.settle(run, &subject, outcome)?;
        Ok(())
    }

    async fn push_action(
        &mut self,
        run: &mut StepRun,
        subject: &str,
        request: ActionRequest,
    ) -> BootstrapResult<()> {
        let outcome = self
            .effects
            .push_action(&request)
            .await
            .map_err(BootstrapError::external(subject))?;
        self.settle(run, subject, outcome)?;
        Ok(())
    }

    async fn issue_native_token(&mut self, run: &mut StepRun) -> BootstrapResult<()> {
        let settings = self.settings;
        let token = &settings.token;
        let admin = &settings.admin_account;
        let supply = token.supply_asset();

        let create = ActionRequest::new(
            token.contract_account.clone(),
            "create",
            json!([admin, supply]),
            token.contract_account.clone(),
        );
        let issue = ActionRequest::new(
            token.contract_account.clone(),
            "issue",
            json!([admin, supply, token.issue_memo]),
            admin.clone(),
        );

        self.push_action(run, &format!("create {supply}"), create)
            .await?;
        self.push_action(run, &format!("issue {supply} to {admin}"), issue)
            .await
    }

    /// Enable protocol features, then replace the boot contract with the
    /// system contract and initialize it with the core symbol
    ///
    /// An initialized system contract means this already happened; the boot
    /// contract is never deployed over it.
    async fn activate_features(&mut self, run: &mut StepRun) -> BootstrapResult<()> {
        let settings = self.settings;
        let governance = &settings.governance;
        let admin = &settings.admin_account;

        let subject = format!("system contract on {admin}");
        let ram_market = self
            .effects
            .table_rows(admin, admin.as_str(), SYSTEM_INIT_TABLE)
            .await
            .map_err(BootstrapError::external(&subject))?;
        if !ram_market.is_empty() {
            let outcome: CallOutcome =
                CallOutcome::already_satisfied("system contract already initialized");
            self.settle(run, &subject, outcome)?;
            return Ok(());
        }

        let subject = "schedule PREACTIVATE_FEATURE";
        let outcome = self
            .effects
            .schedule_feature_activation(&governance.preactivate_feature)
            .await
            .map_err(BootstrapError::external(subject))?;
        if self.settle(run, subject, outcome)?.is_some() && governance.preactivation_wait_ms > 0 {
            tokio::time::sleep(Duration::from_millis(governance.preactivation_wait_ms)).await;
        }

        self.set_contract(run, admin, &governance.boot_contract_dir)
            .await?;

        for digest in &governance.features {
            let request =
                ActionRequest::new(admin.clone(), "activate", json!([digest]), admin.clone());
            self.push_action(run, &format!("activate feature {}", short_digest(digest)), request)
                .await?;
        }

        self.set_contract(run, admin, &governance.system_contract_dir)
            .await?;

        let core_symbol = settings.token.core_symbol();
        let init = ActionRequest::new(
            admin.clone(),
            "init",
            json!([governance.system_version, core_symbol]),
            admin.clone(),
        );
        self.push_action(run, &format!("init system contract ({core_symbol})"), init)
            .await
    }

    async fn register_producers(
        &mut self,
        registry: &AccountRegistry,
        run: &mut StepRun,
    ) -> BootstrapResult<()> {
        let settings = self.settings;
        let governance = &settings.governance;
        for producer in &registry.producers {
            let request = ActionRequest::new(
                settings.admin_account.clone(),
                "regproducer",
                json!([
                    producer.name,
                    producer.public_key,
                    governance.producer_url,
                    governance.producer_location
                ]),
                producer.name.clone(),
            );
            self.push_action(run, &format!("register {}", producer.name), request)
                .await?;
        }
        Ok(())
    }
}

/// Table the system contract fills on `init`
const SYSTEM_INIT_TABLE: &str = "rammarket";

fn password_error(path: &Path) -> impl FnOnce(io::Error) -> BootstrapError + '_ {
    move |source| BootstrapError::Persistence {
        action: "failed to save wallet password to",
        path: path.to_path_buf(),
        source,
    }
}

/// Make sure a freshly created wallet's password will have somewhere to go
fn prepare_password_file(path: &Path) -> BootstrapResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(password_error(path))?;
    }
    persist::ensure_writable(path).map_err(password_error(path))
}

fn save_wallet_password(path: &Path, password: &str) -> BootstrapResult<()> {
    persist::write_secret(path, format!("{password}\n").as_bytes()).map_err(password_error(path))
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
