//! Operator-facing progress output

use super::error::BootstrapError;
use super::plan::BootstrapStep;
use super::state::{BootstrapState, RunReport, SoftSkip, StepReport};
use std::io::{self, Write};

/// Receives progress events from a bootstrap run
///
/// Structured logging happens regardless; this seam is for the human-facing
/// transcript.
pub trait ProgressReporter {
    fn step_started(&mut self, step: &BootstrapStep, total: usize);
    fn call_applied(&mut self, step: &BootstrapStep, subject: &str);
    fn call_skipped(&mut self, step: &BootstrapStep, skip: &SoftSkip);
    fn note(&mut self, step: &BootstrapStep, message: &str);
    fn step_completed(&mut self, step: &BootstrapStep, report: &StepReport);
    fn step_failed(&mut self, step: &BootstrapStep, total: usize, error: &BootstrapError);
    fn run_finished(&mut self, report: &RunReport);
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for &mut P {
    fn step_started(&mut self, step: &BootstrapStep, total: usize) {
        (**self).step_started(step, total);
    }

    fn call_applied(&mut self, step: &BootstrapStep, subject: &str) {
        (**self).call_applied(step, subject);
    }

    fn call_skipped(&mut self, step: &BootstrapStep, skip: &SoftSkip) {
        (**self).call_skipped(step, skip);
    }

    fn note(&mut self, step: &BootstrapStep, message: &str) {
        (**self).note(step, message);
    }

    fn step_completed(&mut self, step: &BootstrapStep, report: &StepReport) {
        (**self).step_completed(step, report);
    }

    fn step_failed(&mut self, step: &BootstrapStep, total: usize, error: &BootstrapError) {
        (**self).step_failed(step, total, error);
    }

    fn run_finished(&mut self, report: &RunReport) {
        (**self).run_finished(report);
    }
}

/// Prints `[i/n] description` headers and one line per external call
pub struct ConsoleProgress<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleProgress {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // A closed stdout must not abort an in-flight bootstrap.
    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out, "{text}") {
            tracing::debug!(error = %err, "Progress output failed");
        }
    }
}

impl<W: Write> ProgressReporter for ConsoleProgress<W> {
    fn step_started(&mut self, step: &BootstrapStep, total: usize) {
        self.line(format_args!("[{}/{total}] {}...", step.index, step.description));
    }

    fn call_applied(&mut self, _step: &BootstrapStep, subject: &str) {
        self.line(format_args!("  ✓ {subject}"));
    }

    fn call_skipped(&mut self, _step: &BootstrapStep, skip: &SoftSkip) {
        self.line(format_args!("  - {}: {} (skipped)", skip.subject, skip.reason));
    }

    fn note(&mut self, _step: &BootstrapStep, message: &str) {
        self.line(format_args!("  {message}"));
    }

    fn step_completed(&mut self, _step: &BootstrapStep, _report: &StepReport) {}

    fn step_failed(&mut self, step: &BootstrapStep, total: usize, error: &BootstrapError) {
        self.line(format_args!("  ✗ step {}/{total} failed: {error}", step.index));
    }

    fn run_finished(&mut self, report: &RunReport) {
        let skipped = report.soft_skips().count();
        match &report.state {
            BootstrapState::Completed => self.line(format_args!(
                "\nBootstrap complete: {} steps, {} changes applied, {skipped} already in place",
                report.steps.len(),
                report.applied(),
            )),
            BootstrapState::Aborted { step, .. } => self.line(format_args!(
                "\nBootstrap aborted at step {step}/{}; completed steps stay applied, re-run after fixing the cause",
                report.total_steps
            )),
            BootstrapState::Ready | BootstrapState::Running { .. } => {}
        }
    }
}
