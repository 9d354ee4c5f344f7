//! Core types for command execution

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Output;

/// A shell script to run, optionally scoped to a working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Script handed to `sh -c`
    pub script: String,
    /// Working directory; inherits the caller's when `None`
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            cwd: None,
        }
    }

    /// Run the script inside `dir`
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cwd {
            Some(dir) => write!(f, "(cd {} && {})", dir.display(), self.script),
            None => f.write_str(&self.script),
        }
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    /// A successful run printing `stdout`
    pub fn success_with(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into().into_bytes(),
            stderr: Vec::new(),
            code: Some(0),
        }
    }

    /// A failed run exiting with `code` and printing `stderr`
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into().into_bytes(),
            code: Some(code),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Best diagnostic text for a failed run: stderr, then stdout, then the exit code
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr_str();
        if !stderr.trim().is_empty() {
            return stderr.trim().to_string();
        }
        let stdout = self.stdout_str();
        if !stdout.trim().is_empty() {
            return stdout.trim().to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Errors raised before a command could produce output
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn `{script}`: {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    #[error("working directory does not exist: {}", .0.display())]
    MissingDir(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let out = CommandOutput {
            stdout: b"partial".to_vec(),
            stderr: b"  E: Unable to locate package\n".to_vec(),
            code: Some(100),
        };
        assert_eq!(out.diagnostic(), "E: Unable to locate package");
    }

    #[test]
    fn test_diagnostic_falls_back_to_status() {
        assert_eq!(
            CommandOutput::failure(3, "").diagnostic(),
            "exited with status 3"
        );

        let killed = CommandOutput {
            code: None,
            ..Default::default()
        };
        assert!(!killed.success());
        assert_eq!(killed.diagnostic(), "terminated by signal");
    }

    #[test]
    fn test_invocation_display() {
        assert_eq!(Invocation::new("npm install").to_string(), "npm install");
        assert_eq!(
            Invocation::new("npm run build").in_dir("/tmp/app").to_string(),
            "(cd /tmp/app && npm run build)"
        );
    }
}
