// ABOUTME: Remote host addressing and command execution over the ssh client.
// ABOUTME: Every remote step is a single `ssh user@host '<script>'` invocation.

use crate::error::{Result, SshError};
use crate::exec::{CommandOutput, CommandRunner};
use std::fmt;

/// Default remote shell executable.
pub const DEFAULT_SSH_PROGRAM: &str = "ssh";

/// The account on the remote host that is being prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub user: String,
    pub host: String,
}

impl RemoteTarget {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    /// `user@host`, as passed to ssh.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

/// What a remote command was trying to do, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    InstallPublicKey,
    CheckConfig,
    UpdateConfig,
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::InstallPublicKey => "add public key to authorized_keys",
            Self::CheckConfig => "check remote SSH configuration",
            Self::UpdateConfig => "update remote SSH configuration",
        };
        f.write_str(text)
    }
}

/// Quote `s` as a single word for a POSIX shell.
///
/// Always wraps in single quotes; embedded single quotes become `'\''`.
pub fn shell_quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            result.push_str("'\\''");
        } else {
            result.push(ch);
        }
    }
    result.push('\'');
    result
}

/// Runs shell scripts on one remote account through the ssh client.
pub struct RemoteShell<'a> {
    runner: &'a dyn CommandRunner,
    program: &'a str,
    target: &'a RemoteTarget,
}

impl<'a> RemoteShell<'a> {
    pub fn new(runner: &'a dyn CommandRunner, program: &'a str, target: &'a RemoteTarget) -> Self {
        Self {
            runner,
            program,
            target,
        }
    }

    pub fn target(&self) -> &RemoteTarget {
        self.target
    }

    /// Run `script` on the remote host.
    ///
    /// # Errors
    /// Returns `SshError::RemoteCommand` tagged with `action` when ssh (or the
    /// script) exits non-zero, and `SshError::Spawn` when ssh cannot start.
    pub fn run(&self, action: RemoteAction, script: &str) -> Result<CommandOutput> {
        let args = vec![self.target.destination(), script.to_string()];
        let output = self.runner.run(self.program, &args)?;

        if !output.success() {
            return Err(SshError::RemoteCommand {
                action,
                destination: self.target.destination(),
                status: output.status(),
                diagnostic: output.diagnostic(),
            });
        }
        Ok(output)
    }
}
