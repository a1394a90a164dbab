// ABOUTME: Error types for SSH key and remote command operations using thiserror.
// ABOUTME: Groups failures into configuration, not-found, external command, and I/O categories.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::remote::RemoteAction;

/// Broad failure classes shared by every rvs crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or environment: unsupported key type, missing tool, bad template.
    Configuration,
    /// A file that an operation requires does not exist.
    NotFound,
    /// An external program exited unsuccessfully or could not be started.
    ExternalCommand,
    /// Reading or writing a local file failed.
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration error",
            Self::NotFound => "not found",
            Self::ExternalCommand => "external command error",
            Self::Io => "I/O error",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during SSH key and remote operations.
#[derive(Error, Debug)]
pub enum SshError {
    /// Key type outside the supported set.
    #[error("unsupported key type '{0}' (supported types: rsa, ed25519)")]
    UnsupportedKeyType(String),

    /// A required executable is not on PATH.
    #[error("{program} command not found; ensure OpenSSH is installed and in your PATH")]
    ToolNotFound { program: String },

    /// A private or public key file that must exist is missing.
    #[error("key file not found: {path}")]
    KeyNotFound { path: PathBuf },

    /// Failed to read a key file from disk.
    #[error("failed to read key file {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The public key file does not hold an OpenSSH public key.
    #[error("invalid SSH public key in {path}: {source}")]
    InvalidPublicKey {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    /// Failed to encode a key for fingerprinting.
    #[error("failed to serialize key: {0}")]
    SerializeKey(#[source] ssh_key::Error),

    /// The key generation tool failed.
    #[error("error generating SSH key pair at {path}: {message}")]
    KeyGeneration { path: PathBuf, message: String },

    /// An external program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A command on the remote host failed (includes authentication failures).
    #[error("failed to {action} on {destination} ({status}): {diagnostic}")]
    RemoteCommand {
        action: RemoteAction,
        destination: String,
        status: String,
        diagnostic: String,
    },
}

impl SshError {
    /// Which broad failure class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedKeyType(_)
            | Self::ToolNotFound { .. }
            | Self::InvalidPublicKey { .. }
            | Self::SerializeKey(_) => ErrorCategory::Configuration,
            Self::KeyNotFound { .. } => ErrorCategory::NotFound,
            Self::KeyGeneration { .. } | Self::Spawn { .. } | Self::RemoteCommand { .. } => {
                ErrorCategory::ExternalCommand
            }
            Self::ReadKey { .. } => ErrorCategory::Io,
        }
    }
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;
