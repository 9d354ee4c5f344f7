//! Recording backend - answers invocations without running anything

use crate::executor::Executor;
use crate::types::{CommandOutput, ExecError, Invocation};
use std::sync::{Mutex, PoisonError};

/// Executor that records every invocation and replies from scripted rules
///
/// Rules are matched by script prefix in insertion order; the first match
/// wins. Scripts matching no rule succeed with empty output.
#[derive(Debug, Default)]
pub struct Recorder {
    rules: Vec<(String, CommandOutput)>,
    log: Mutex<Vec<Invocation>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to scripts starting with `prefix`
    pub fn respond(mut self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.rules.push((prefix.into(), output));
        self
    }

    /// Everything executed so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Scripts executed so far, in order
    pub fn scripts(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.script).collect()
    }

    /// Whether any executed script starts with `prefix`
    pub fn ran(&self, prefix: &str) -> bool {
        self.invocations()
            .iter()
            .any(|i| i.script.starts_with(prefix))
    }

    fn reply_for(&self, script: &str) -> CommandOutput {
        self.rules
            .iter()
            .find(|(prefix, _)| script.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::success_with(""))
    }
}

impl Executor for Recorder {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        log::debug!("record: {invocation}");
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());
        Ok(self.reply_for(&invocation.script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reply_is_success() {
        let rec = Recorder::new();
        let out = rec.execute(&Invocation::new("apt update")).unwrap();
        assert!(out.success());
        assert!(out.stdout.is_empty());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rec = Recorder::new()
            .respond("node -v", CommandOutput::success_with("v20.11.0\n"))
            .respond("node", CommandOutput::failure(1, "unreachable"));

        let out = rec.execute(&Invocation::new("node -v")).unwrap();
        assert_eq!(out.stdout_str(), "v20.11.0\n");
    }

    #[test]
    fn test_records_in_order_with_cwd() {
        let rec = Recorder::new();
        rec.execute(&Invocation::new("npm install").in_dir("/srv/app"))
            .unwrap();
        rec.execute(&Invocation::new("npm run build").in_dir("/srv/app"))
            .unwrap();

        assert_eq!(rec.scripts(), vec!["npm install", "npm run build"]);
        assert!(rec.ran("npm run"));
        assert!(!rec.ran("pm2"));
        assert_eq!(
            rec.invocations()[0].cwd.as_deref(),
            Some(std::path::Path::new("/srv/app"))
        );
    }
}
