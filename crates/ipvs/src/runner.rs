//! External process execution.

use common::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an external program to completion.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run `program` with `args` and capture its output.
    ///
    /// A non-zero exit is not an error here; only failing to spawn is.
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput>;
}

/// Runs commands with `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        debug!(program = %program.display(), ?args, "Spawning command");
        let output = Command::new(program).args(args).output().map_err(Error::Io)?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
