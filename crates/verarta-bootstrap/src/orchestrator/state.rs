//! Run state and per-step results

use super::error::BootstrapError;
use super::plan::StepAction;
use std::fmt;

/// Where a bootstrap run is
///
/// Runs only move forward: `Ready`, then `Running` once per step in plan
/// order, then one of the terminal states.
#[derive(Debug)]
pub enum BootstrapState {
    Ready,
    Running { step: usize },
    Completed,
    Aborted { step: usize, cause: BootstrapError },
}

impl BootstrapState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted { .. })
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::Running { step } => write!(f, "Running({step})"),
            Self::Completed => write!(f, "Completed"),
            Self::Aborted { step, .. } => write!(f, "Aborted({step})"),
        }
    }
}

/// An external call the service reported as already done
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftSkip {
    pub subject: String,
    pub reason: String,
}

/// Outcome of one finished step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub index: usize,
    pub action: StepAction,
    /// Calls that changed node or wallet state
    pub applied: usize,
    pub soft_skips: Vec<SoftSkip>,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunReport {
    /// Always terminal
    pub state: BootstrapState,
    /// Steps that finished, in order
    pub steps: Vec<StepReport>,
    pub total_steps: usize,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.state, BootstrapState::Completed)
    }

    pub fn soft_skips(&self) -> impl Iterator<Item = (usize, &SoftSkip)> {
        self.steps
            .iter()
            .flat_map(|s| s.soft_skips.iter().map(move |skip| (s.index, skip)))
    }

    pub fn applied(&self) -> usize {
        self.steps.iter().map(|s| s.applied).sum()
    }

    pub fn step(&self, action: StepAction) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.action == action)
    }
}
