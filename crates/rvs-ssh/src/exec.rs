// ABOUTME: Narrow command-execution seam for external tools (ssh-keygen, ssh).
// ABOUTME: SystemRunner shells out for real; tests substitute a recording fake.

use crate::error::{Result, SshError};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of one external program run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
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

    /// Human-readable exit status, e.g. `exit code 255`.
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }

    /// The tool's own explanation of what went wrong.
    ///
    /// Prefers stderr, falls back to stdout, and finally to the exit status.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        self.status()
    }
}

/// Runs external programs on behalf of the setup steps.
///
/// Implementations block until the program exits. There is no timeout.
pub trait CommandRunner {
    /// Run `program` with `args`, capturing its output.
    ///
    /// A non-zero exit is not an error at this level; only failure to start
    /// the program is.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Resolve `program` on the execution path.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runs programs with `std::process::Command`.
///
/// Stdin is inherited so that ssh can still ask for a password or host key
/// confirmation on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(program, ?args, "Running external command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|source| SshError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program, status = %result.status(), "External command finished");
        Ok(result)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = CommandOutput {
            code: Some(1),
            stdout: "partial output\n".to_string(),
            stderr: "  fatal: boom \n".to_string(),
        };
        assert_eq!(output.diagnostic(), "fatal: boom");
    }

    #[test]
    fn test_diagnostic_falls_back_to_stdout_then_status() {
        let output = CommandOutput {
            code: Some(2),
            stdout: "only stdout".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.diagnostic(), "only stdout");

        let silent = CommandOutput {
            code: None,
            ..Default::default()
        };
        assert_eq!(silent.diagnostic(), "terminated by signal");
    }

    #[test]
    fn test_success_only_for_zero() {
        assert!(CommandOutput::ok("").success());
        assert!(!CommandOutput::failed(255, "denied").success());
        assert!(!CommandOutput::default().success());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let runner = SystemRunner;
        let output = runner
            .run("sh", &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()])
            .expect("sh should start");
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let runner = SystemRunner;
        let err = runner
            .run("rvs-definitely-not-a-real-program", &[])
            .expect_err("missing program should fail to spawn");
        assert!(matches!(err, SshError::Spawn { .. }));
    }

    #[test]
    fn test_locate_missing_program() {
        assert!(SystemRunner
            .locate("rvs-definitely-not-a-real-program")
            .is_none());
    }
}
