//! The execution capability and its real shell backend

use crate::types::{CommandOutput, ExecError, Invocation};
use std::process::{Command, Stdio};

/// Capability to run an external command and capture its text output
///
/// Implementations never interpret the exit code: a non-zero status is a
/// normal `Ok(CommandOutput)`. `Err` is reserved for runs that could not
/// start at all.
pub trait Executor: Send + Sync {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        (**self).execute(invocation)
    }
}

/// Runs scripts through `sh -c`
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different POSIX shell (e.g. `bash`)
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Executor for ShellExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&invocation.script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &invocation.cwd {
            if !dir.is_dir() {
                return Err(ExecError::MissingDir(dir.clone()));
            }
            cmd.current_dir(dir);
        }

        log::debug!("exec: {invocation}");

        let output = cmd.output().map_err(|source| ExecError::Spawn {
            script: invocation.script.clone(),
            source,
        })?;
        let output = CommandOutput::from(output);

        log::trace!(
            "exit={:?} stdout={}B stderr={}B",
            output.code,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let out = ShellExecutor::new()
            .execute(&Invocation::new("echo hello"))
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout_str().trim(), "hello");
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let out = ShellExecutor::new()
            .execute(&Invocation::new("echo boom >&2; exit 4"))
            .unwrap();
        assert!(!out.success());
        assert_eq!(out.code, Some(4));
        assert_eq!(out.diagnostic(), "boom");
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let out = ShellExecutor::new()
            .execute(&Invocation::new("ls").in_dir(dir.path()))
            .unwrap();
        assert!(out.stdout_str().contains("marker.txt"));
    }

    #[test]
    fn test_missing_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");

        let err = ShellExecutor::new()
            .execute(&Invocation::new("true").in_dir(&gone))
            .unwrap_err();
        assert!(matches!(err, ExecError::MissingDir(p) if p == gone));
    }

    #[test]
    fn test_spawn_failure() {
        let err = ShellExecutor::with_shell("/nonexistent/shell")
            .execute(&Invocation::new("true"))
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
