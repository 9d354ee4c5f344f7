//! The single gateway to external commands
//!
//! Every shell-out goes through [`CommandRunner`], which turns the outcome
//! into a [`StepResult`] and reports it. Failures never propagate: the
//! caller decides per call site whether a result matters.

use shellrun::{Executor, Invocation};
use std::cell::Cell;
use std::path::Path;

use crate::ui::Reporter;

/// Outcome of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub succeeded: bool,
    /// Captured stdout on success, diagnostic text on failure
    pub output: String,
}

impl StepResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }
}

/// Whether a failure should be reported to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    /// Failure is a defect: print an error line
    Report,
    /// Failure is an expected answer: stay silent
    Probe,
}

pub struct CommandRunner<'a> {
    executor: &'a dyn Executor,
    reporter: &'a dyn Reporter,
    failures: Cell<usize>,
}

impl<'a> CommandRunner<'a> {
    pub fn new(executor: &'a dyn Executor, reporter: &'a dyn Reporter) -> Self {
        Self {
            executor,
            reporter,
            failures: Cell::new(0),
        }
    }

    pub fn reporter(&self) -> &'a dyn Reporter {
        self.reporter
    }

    /// Run a command; a non-zero exit is reported as an error line
    pub fn run(&self, script: &str, description: &str) -> StepResult {
        self.exec(&Invocation::new(script), description, Check::Report)
    }

    /// Run a command inside `dir`; a non-zero exit is reported as an error line
    pub fn run_in(&self, dir: &Path, script: &str, description: &str) -> StepResult {
        self.exec(&Invocation::new(script).in_dir(dir), description, Check::Report)
    }

    /// Run an exploratory check; failure is silent
    pub fn probe(&self, script: &str, description: &str) -> StepResult {
        self.exec(&Invocation::new(script), description, Check::Probe)
    }

    /// Number of reported (non-probe) failures so far
    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    /// Report a failure that happened outside a command (e.g. a file write)
    pub fn report_failure(&self, description: &str, err: &anyhow::Error) {
        self.failures.set(self.failures.get() + 1);
        self.reporter.error(&format!("{description}: {err:#}"));
    }

    fn exec(&self, invocation: &Invocation, description: &str, check: Check) -> StepResult {
        self.reporter.busy(description);

        let result = match self.executor.execute(invocation) {
            Ok(out) if out.success() => StepResult::ok(out.stdout_str()),
            Ok(out) => StepResult::failed(out.diagnostic()),
            Err(e) => StepResult::failed(e.to_string()),
        };

        if result.succeeded {
            self.reporter.success(description);
        } else {
            match check {
                Check::Report => {
                    self.failures.set(self.failures.get() + 1);
                    self.reporter
                        .error(&format!("{description}: {}", result.output));
                }
                Check::Probe => {
                    log::debug!("probe failed ({description}): {}", result.output);
                }
            }
        }

        result
    }
}

/// Single-quote `s` for a POSIX shell
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
