// ABOUTME: Error types for the setup steps using thiserror.
// ABOUTME: Wraps SshError and adds template, configuration, and file I/O failures.

use rvs_ssh::{ErrorCategory, SshError};
use std::path::PathBuf;
use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Ssh(#[from] SshError),

    #[error("failed to render template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid {name} '{value}': {reason}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("could not determine home directory")]
    HomeDirectory,

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set permissions on {path}: {source}")]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SetupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Ssh(err) => err.category(),
            Self::Template { .. }
            | Self::Config(_)
            | Self::InvalidArgument { .. }
            | Self::HomeDirectory => ErrorCategory::Configuration,
            Self::ReadFile { .. }
            | Self::WriteFile { .. }
            | Self::CreateDirectory { .. }
            | Self::SetPermissions { .. } => ErrorCategory::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, SetupError>;
