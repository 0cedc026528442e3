//! The bootstrap sequence as data

use std::fmt;

/// How a step treats "already satisfied" reports from the node or wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyPolicy {
    /// Local work only; the step makes no external call
    Local,
    /// "Already exists" style failures count as soft success
    SoftOnExisting,
}

/// Unit of work a step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepAction {
    CreateWallet,
    LoadRegistry,
    ImportKeys,
    CreateSystemAccounts,
    CreateProducerAccounts,
    CreateUserAccounts,
    DeployTokenContract,
    IssueNativeToken,
    ActivateFeatures,
    RegisterProducers,
}

impl StepAction {
    pub const fn description(self) -> &'static str {
        match self {
            Self::CreateWallet => "Creating wallet",
            Self::LoadRegistry => "Loading account registry",
            Self::ImportKeys => "Importing keys to wallet",
            Self::CreateSystemAccounts => "Creating system accounts",
            Self::CreateProducerAccounts => "Creating producer accounts",
            Self::CreateUserAccounts => "Creating user accounts",
            Self::DeployTokenContract => "Deploying token contract",
            Self::IssueNativeToken => "Creating and issuing native token",
            Self::ActivateFeatures => "Activating protocol features and deploying system contract",
            Self::RegisterProducers => "Registering block producers",
        }
    }

    pub const fn policy(self) -> IdempotencyPolicy {
        match self {
            Self::LoadRegistry => IdempotencyPolicy::Local,
            _ => IdempotencyPolicy::SoftOnExisting,
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One numbered entry of a [`BootstrapPlan`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStep {
    /// 1-based position in the plan
    pub index: usize,
    pub description: &'static str,
    pub action: StepAction,
    pub policy: IdempotencyPolicy,
}

/// Ordered list of steps executed by the orchestrator's driver loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    steps: Vec<BootstrapStep>,
}

impl BootstrapPlan {
    /// Full testnet bootstrap
    ///
    /// Producer registration is an action of the system contract, so the
    /// governance step has to come first.
    pub const STANDARD: [StepAction; 10] = [
        StepAction::CreateWallet,
        StepAction::LoadRegistry,
        StepAction::ImportKeys,
        StepAction::CreateSystemAccounts,
        StepAction::CreateProducerAccounts,
        StepAction::CreateUserAccounts,
        StepAction::DeployTokenContract,
        StepAction::IssueNativeToken,
        StepAction::ActivateFeatures,
        StepAction::RegisterProducers,
    ];

    pub fn standard() -> Self {
        Self::from_actions(Self::STANDARD)
    }

    /// Number the given actions from 1 in iteration order
    pub fn from_actions(actions: impl IntoIterator<Item = StepAction>) -> Self {
        let steps = actions
            .into_iter()
            .enumerate()
            .map(|(i, action)| BootstrapStep {
                index: i + 1,
                description: action.description(),
                action,
                policy: action.policy(),
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[BootstrapStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, action: StepAction) -> Option<&BootstrapStep> {
        self.steps.iter().find(|s| s.action == action)
    }
}

impl Default for BootstrapPlan {
    fn default() -> Self {
        Self::standard()
    }
}
