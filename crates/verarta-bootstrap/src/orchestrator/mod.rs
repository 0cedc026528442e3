//! Bootstrap orchestrator
//!
//! Drives the node and wallet service through a [`BootstrapPlan`] in strict
//! order, one awaited call at a time. Each step is logged before it runs and
//! its result after. Calls the service reports as already satisfied are soft
//! successes, which is what makes a re-run from step 1 safe; any other
//! failure aborts the run without retry or rollback.
//!
//! The account registry is read before the first step so that bootstrapping
//! without generated accounts fails before anything touches the network.

mod error;
mod plan;
mod progress;
mod state;
mod steps;

pub use error::{BootstrapError, BootstrapResult};
pub use plan::{BootstrapPlan, BootstrapStep, IdempotencyPolicy, StepAction};
pub use progress::{ConsoleProgress, ProgressReporter};
pub use state::{BootstrapState, RunReport, SoftSkip, StepReport};

use verarta_core::{
    AccountRegistry, BootstrapSettings, CallOutcome, ChainEffects, WalletEffects,
};

/// Runs a bootstrap plan against a node and wallet service
pub struct BootstrapOrchestrator<'a, E: ?Sized, P> {
    effects: &'a E,
    settings: &'a BootstrapSettings,
    plan: BootstrapPlan,
    progress: P,
    state: BootstrapState,
}

/// Bookkeeping for the step currently executing
struct StepRun {
    step: BootstrapStep,
    applied: usize,
    soft_skips: Vec<SoftSkip>,
}

impl StepRun {
    fn new(step: BootstrapStep) -> Self {
        Self {
            step,
            applied: 0,
            soft_skips: Vec::new(),
        }
    }

    fn finish(self) -> StepReport {
        StepReport {
            index: self.step.index,
            action: self.step.action,
            applied: self.applied,
            soft_skips: self.soft_skips,
        }
    }
}

impl<'a, E, P> BootstrapOrchestrator<'a, E, P>
where
    E: ChainEffects + WalletEffects + ?Sized,
    P: ProgressReporter,
{
    /// Orchestrator for the standard ten-step plan
    pub fn new(effects: &'a E, settings: &'a BootstrapSettings, progress: P) -> Self {
        Self {
            effects,
            settings,
            plan: BootstrapPlan::standard(),
            progress,
            state: BootstrapState::Ready,
        }
    }

    pub fn with_plan(mut self, plan: BootstrapPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn plan(&self) -> &BootstrapPlan {
        &self.plan
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// Execute every step, stopping at the first fatal error
    pub async fn run(mut self) -> RunReport {
        let total = self.plan.len();
        let steps = self.plan.steps().to_vec();

        let registry = match AccountRegistry::load(&self.settings.registry_path) {
            Ok(registry) => registry,
            Err(err) => {
                let step = self
                    .plan
                    .step(StepAction::LoadRegistry)
                    .or_else(|| steps.first())
                    .cloned();
                let cause = BootstrapError::from(err);
                tracing::error!(error = %cause, "Registry preflight failed");
                return match step {
                    Some(step) => self.abort(&step, cause, Vec::new()),
                    None => self.finish(BootstrapState::Aborted { step: 0, cause }, Vec::new()),
                };
            }
        };

        let mut reports = Vec::with_capacity(total);
        for step in steps {
            self.transition(BootstrapState::Running { step: step.index });
            self.progress.step_started(&step, total);
            tracing::info!(step = step.index, total, "{}", step.description);

            let mut run = StepRun::new(step);
            match self.execute(&registry, &mut run).await {
                Ok(()) => {
                    tracing::info!(
                        step = run.step.index,
                        applied = run.applied,
                        soft_skips = run.soft_skips.len(),
                        "Step complete"
                    );
                    let step = run.step.clone();
                    let report = run.finish();
                    self.progress.step_completed(&step, &report);
                    reports.push(report);
                }
                Err(cause) => return self.abort(&run.step, cause, reports),
            }
        }

        self.finish(BootstrapState::Completed, reports)
    }

    fn transition(&mut self, next: BootstrapState) {
        tracing::debug!(from = %self.state, to = %next, "Bootstrap state transition");
        self.state = next;
    }

    fn abort(
        mut self,
        step: &BootstrapStep,
        cause: BootstrapError,
        reports: Vec<StepReport>,
    ) -> RunReport {
        let total = self.plan.len();
        tracing::error!(step = step.index, error = %cause, "Bootstrap aborted");
        self.progress.step_failed(step, total, &cause);
        self.finish(
            BootstrapState::Aborted {
                step: step.index,
                cause,
            },
            reports,
        )
    }

    fn finish(mut self, terminal: BootstrapState, steps: Vec<StepReport>) -> RunReport {
        tracing::debug!(from = %self.state, to = %terminal, "Bootstrap state transition");
        let report = RunReport {
            state: terminal,
            steps,
            total_steps: self.plan.len(),
        };
        self.progress.run_finished(&report);
        report
    }

    /// Account for one external call's outcome under the step's policy
    ///
    /// Returns the call's payload when it was applied.
    fn settle<T>(
        &mut self,
        run: &mut StepRun,
        subject: &str,
        outcome: CallOutcome<T>,
    ) -> BootstrapResult<Option<T>> {
        match outcome {
            CallOutcome::Applied(value) => {
                run.applied += 1;
                tracing::debug!(step = run.step.index, subject, "Applied");
                self.progress.call_applied(&run.step, subject);
                Ok(Some(value))
            }
            CallOutcome::AlreadySatisfied { reason } => match run.step.policy {
                IdempotencyPolicy::SoftOnExisting => {
                    tracing::warn!(step = run.step.index, subject, %reason, "Already satisfied, continuing");
                    let skip = SoftSkip {
                        subject: subject.to_string(),
                        reason,
                    };
                    self.progress.call_skipped(&run.step, &skip);
                    run.soft_skips.push(skip);
                    Ok(None)
                }
                IdempotencyPolicy::Local => Err(BootstrapError::UnexpectedOutcome {
                    subject: subject.to_string(),
                    reason,
                }),
            },
        }
    }

    fn note(&mut self, run: &StepRun, message: &str) {
        tracing::info!(step = run.step.index, "{message}");
        self.progress.note(&run.step, message);
    }
}
