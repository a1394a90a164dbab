// ABOUTME: Library root for rvs-setup.
// ABOUTME: Exports config, template, local/remote config writers, and the orchestrator.

pub mod config;
pub mod error;
pub mod local_config;
pub mod remote_config;
pub mod setup;
pub mod template;

pub use config::{RemoteCheckMode, SetupConfig};
pub use error::{Result, SetupError};
pub use local_config::{
    create_ssh_configuration_on_localhost, include_block, merge_include, LocalConfigRequest,
};
pub use remote_config::{create_ssh_configuration_on_remotehost, RemoteConfigStatus};
pub use setup::{local_hostname, Bootstrapper, SetupPaths};

/// Bootstrap SSH access to `remote_user@remote_host` with the current
/// user's configuration and the real OpenSSH tools.
pub fn run(git_user: &str, remote_user: &str, remote_host: &str) -> anyhow::Result<()> {
    use anyhow::Context;

    let config = SetupConfig::load().context("Failed to load configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    let key_path = Bootstrapper::from_config(config)
        .authorize_localhost_to_access_remotehost(git_user, remote_user, remote_host)
        .with_context(|| format!("Failed to set up SSH access to {remote_user}@{remote_host}"))?;

    tracing::info!(key_path = %key_path.display(), "Done");
    Ok(())
}
