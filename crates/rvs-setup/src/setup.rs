// ABOUTME: Orchestrates the one-time trust bootstrap for a remote host.
// ABOUTME: Key presence decides between the full four-step run and a no-op.

use crate::config::SetupConfig;
use crate::error::{Result, SetupError};
use crate::local_config::{create_ssh_configuration_on_localhost, LocalConfigRequest};
use crate::remote_config::create_ssh_configuration_on_remotehost;
use rvs_ssh::{
    add_public_key_to_remote, generate_key_pair, public_key_path, CommandRunner, KeyType,
    RemoteShell, RemoteTarget, SystemRunner,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Every local path the bootstrap touches for one remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPaths {
    pub ssh_dir: PathBuf,
    /// `<ssh_dir>/<remote_host>`
    pub key_dir: PathBuf,
    /// `<key_dir>/id_<key_type>`
    pub key_path: PathBuf,
    pub public_key_path: PathBuf,
    /// `<key_dir>/config`
    pub local_config_path: PathBuf,
    /// `<ssh_dir>/config`
    pub global_config_path: PathBuf,
    /// Key comment, `<remote_host>@<local_hostname>`.
    pub comment: String,
}

impl SetupPaths {
    pub fn derive(
        ssh_dir: &Path,
        remote_host: &str,
        key_type: KeyType,
        local_hostname: &str,
    ) -> Self {
        let key_dir = ssh_dir.join(remote_host);
        let key_path = key_dir.join(key_type.file_name());
        Self {
            ssh_dir: ssh_dir.to_path_buf(),
            public_key_path: public_key_path(&key_path),
            local_config_path: key_dir.join("config"),
            global_config_path: ssh_dir.join("config"),
            comment: format!("{remote_host}@{local_hostname}"),
            key_path,
            key_dir,
        }
    }
}

/// Name of this machine, or `unknown` when it cannot be determined.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Runs the bootstrap steps with a given configuration and command runner.
pub struct Bootstrapper<R> {
    config: SetupConfig,
    runner: R,
    local_hostname: String,
}

impl Bootstrapper<SystemRunner> {
    /// Bootstrapper that runs the real OpenSSH tools.
    pub fn from_config(config: SetupConfig) -> Self {
        Self::new(config, SystemRunner, local_hostname())
    }
}

impl<R: CommandRunner> Bootstrapper<R> {
    pub fn new(config: SetupConfig, runner: R, local_hostname: impl Into<String>) -> Self {
        Self {
            config,
            runner,
            local_hostname: local_hostname.into(),
        }
    }

    pub fn config(&self) -> &SetupConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn paths(&self, remote_host: &str) -> SetupPaths {
        SetupPaths::derive(
            &self.config.ssh_dir,
            remote_host,
            self.config.key_type,
            &self.local_hostname,
        )
    }

    /// Generate a key pair for `remote_host`, install it for `remote_user`,
    /// and write the local and remote SSH config fragments.
    ///
    /// If the key already exists nothing else happens, even when an earlier
    /// run failed part way. Steps run in order and the first failure aborts
    /// the rest; nothing is rolled back.
    ///
    /// Returns the private key path in both cases.
    pub fn authorize_localhost_to_access_remotehost(
        &self,
        git_user: &str,
        remote_user: &str,
        remote_host: &str,
    ) -> Result<PathBuf> {
        validate_git_user(git_user)?;
        validate_remote_user(remote_user)?;
        validate_remote_host(remote_host)?;

        let paths = self.paths(remote_host);
        ensure_private_dir(&paths.key_dir)?;

        if paths.key_path.exists() {
            info!(key_path = %paths.key_path.display(), "SSH key already exists");
            return Ok(paths.key_path);
        }

        self.check_templates()?;

        generate_key_pair(
            &self.runner,
            &self.config.keygen_program,
            self.config.key_type,
            &paths.key_path,
            &paths.comment,
        )?;

        let target = RemoteTarget::new(remote_user, remote_host);
        let shell = RemoteShell::new(&self.runner, &self.config.ssh_program, &target);
        add_public_key_to_remote(
            &shell,
            &paths.public_key_path,
            self.config.dedupe_authorized_keys,
        )?;

        let local_template = self.config.local_template_path();
        create_ssh_configuration_on_localhost(&LocalConfigRequest {
            key_path: &paths.key_path,
            git_user,
            remote_host,
            template_path: &local_template,
            fragment_path: &paths.local_config_path,
            global_config_path: &paths.global_config_path,
        })?;

        create_ssh_configuration_on_remotehost(
            &shell,
            &self.config.remote_template_path(),
            git_user,
            self.config.remote_check,
        )?;

        info!(remote = %target, key_path = %paths.key_path.display(), "Remote host setup complete");
        Ok(paths.key_path)
    }

    /// Both templates must be readable before a key is generated; a key on
    /// disk makes every later run a no-op.
    fn check_templates(&self) -> Result<()> {
        for path in [
            self.config.local_template_path(),
            self.config.remote_template_path(),
        ] {
            if !path.is_file() {
                return Err(SetupError::ReadFile {
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "template file not found",
                    ),
                    path,
                });
            }
        }
        Ok(())
    }
}

/// Create `dir` (and parents) if missing; newly created directories get 0700.
fn ensure_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut missing = Vec::new();
    let mut current = Some(dir);
    while let Some(path) = current.filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
        missing.push(path.to_path_buf());
        current = path.parent();
    }

    std::fs::create_dir_all(dir).map_err(|e| SetupError::CreateDirectory {
        path: dir.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for path in &missing {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).map_err(
                |e| SetupError::SetPermissions {
                    path: path.clone(),
                    source: e,
                },
            )?;
        }
    }
    #[cfg(not(unix))]
    let _ = missing;

    Ok(())
}

fn validate_git_user(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid("git_user", value, "must not be empty"));
    }
    Ok(())
}

fn validate_remote_user(value: &str) -> Result<()> {
    validate_ssh_word("remote_user", value)?;
    if value.contains('@') {
        return Err(invalid("remote_user", value, "must not contain '@'"));
    }
    Ok(())
}

fn validate_remote_host(value: &str) -> Result<()> {
    validate_ssh_word("remote_host", value)?;
    if value.contains('/') || value.contains('\\') {
        return Err(invalid(
            "remote_host",
            value,
            "must not contain path separators",
        ));
    }
    if value == "." || value == ".." {
        return Err(invalid("remote_host", value, "must not be '.' or '..'"));
    }
    Ok(())
}

/// Shared rules for values that end up in the ssh destination argument.
fn validate_ssh_word(name: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(name, value, "must not be empty"));
    }
    if value.starts_with('-') {
        return Err(invalid(name, value, "must not start with '-'"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(name, value, "must not contain whitespace"));
    }
    Ok(())
}

fn invalid(name: &'static str, value: &str, reason: &'static str) -> SetupError {
    SetupError::InvalidArgument {
        name,
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvs_ssh::testing::RecordingRunner;
    use rvs_ssh::{CommandOutput, ErrorCategory, SshError, DEFAULT_KEYGEN_PROGRAM};
    use tempfile::TempDir;

    fn bootstrapper(dir: &TempDir, runner: RecordingRunner) -> Bootstrapper<RecordingRunner> {
        let mut config = SetupConfig::with_home(dir.path());
        config.template_dir = dir.path().join("templates");
        std::fs::create_dir_all(&config.template_dir).unwrap();
        std::fs::write(
            config.local_template_path(),
            "Host {remote_host}\n    IdentityFile {key_path}\n",
        )
        .unwrap();
        std::fs::write(config.remote_template_path(), "SetEnv GIT_USER={git_user}\n").unwrap();
        Bootstrapper::new(config, runner, "laptop")
    }

    #[test]
    fn test_paths_derivation() {
        let paths = SetupPaths::derive(
            Path::new("/home/alice/.ssh"),
            "10.0.0.5",
            KeyType::Ed25519,
            "laptop",
        );
        assert_eq!(paths.key_dir, PathBuf::from("/home/alice/.ssh/10.0.0.5"));
        assert_eq!(
            paths.key_path,
            PathBuf::from("/home/alice/.ssh/10.0.0.5/id_ed25519")
        );
        assert_eq!(
            paths.public_key_path,
            PathBuf::from("/home/alice/.ssh/10.0.0.5/id_ed25519.pub")
        );
        assert_eq!(
            paths.local_config_path,
            PathBuf::from("/home/alice/.ssh/10.0.0.5/config")
        );
        assert_eq!(
            paths.global_config_path,
            PathBuf::from("/home/alice/.ssh/config")
        );
        assert_eq!(paths.comment, "10.0.0.5@laptop");
    }

    #[test]
    fn test_paths_follow_key_type() {
        let paths = SetupPaths::derive(Path::new("/s"), "h", KeyType::Rsa, "l");
        assert_eq!(paths.key_path, PathBuf::from("/s/h/id_rsa"));
    }

    #[test]
    fn test_local_hostname_not_empty() {
        assert!(!local_hostname().is_empty());
    }

    #[test]
    fn test_existing_key_skips_everything() {
        let dir = TempDir::new().unwrap();
        let setup = bootstrapper(&dir, RecordingRunner::new());
        let paths = setup.paths("10.0.0.5");
        std::fs::create_dir_all(&paths.key_dir).unwrap();
        std::fs::write(&paths.key_path, "existing").unwrap();

        let key_path = setup
            .authorize_localhost_to_access_remotehost("alice", "bob", "10.0.0.5")
            .unwrap();

        assert_eq!(key_path, paths.key_path);
        assert!(setup.runner().calls().is_empty());
        assert!(!paths.local_config_path.exists());
        assert!(!paths.global_config_path.exists());
    }

    #[test]
    fn test_step_order() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        runner.push_output("ssh", CommandOutput::ok(""));
        runner.push_output("ssh", CommandOutput::ok("NOT_FOUND\n"));
        let setup = bootstrapper(&dir, runner);

        setup
            .authorize_localhost_to_access_remotehost("alice", "bob", "10.0.0.5")
            .unwrap();

        let programs: Vec<String> = setup
            .runner()
            .calls()
            .into_iter()
            .map(|call| call.program)
            .collect();
        assert_eq!(programs, vec!["ssh-keygen", "ssh", "ssh", "ssh"]);
    }

    #[test]
    fn test_install_failure_aborts_and_keeps_key() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        runner.push_output("ssh", CommandOutput::failed(255, "Permission denied"));
        let setup = bootstrapper(&dir, runner);

        let err = setup
            .authorize_localhost_to_access_remotehost("alice", "bob", "10.0.0.5")
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ExternalCommand);

        let paths = setup.paths("10.0.0.5");
        assert!(paths.key_path.exists());
        assert!(!paths.local_config_path.exists());
        assert_eq!(setup.runner().calls().len(), 2);

        // a re-run sees the key and does nothing
        setup
            .authorize_localhost_to_access_remotehost("alice", "bob", "10.0.0.5")
            .unwrap();
        assert_eq!(setup.runner().calls().len(), 2);
    }

    #[test]
    fn test_missing_keygen_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let setup = bootstrapper(
            &dir,
            RecordingRunner::new().with_missing(DEFAULT_KEYGEN_PROGRAM),
        );

        let err = setup
            .authorize_localhost_to_access_remotehost("alice", "bob", "10.0.0.5")
            .unwrap_err();
        assert!(matches!(err, SetupError::Ssh(SshError::ToolNotFound { .. })));
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(setup.runner().calls().is_empty());
    }

    #[test]
    fn test_missing_template_fails_before_key_generation() {
        let dir = TempDir::new().unwrap();
        let setup = bootstrapper(&dir, RecordingRunner::new());
        std::fs::remove_file(setup.config().remote_template_path()).unwrap();

        let err = setup
            .authorize_localhost_to_access_remotehost("alice", "bob", "10.0.0.5")
            .unwrap_err();
        assert!(matches!(err, SetupError::ReadFile { .. }));
        assert!(setup.runner().calls().is_empty());
        assert!(!setup.paths("10.0.0.5").key_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_key_dir_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let setup = bootstrapper(&dir, RecordingRunner::new());
        setup
            .authorize_localhost_to_access_remotehost("alice", "bob", "10.0.0.5")
            .unwrap();

        for path in [dir.path().join(".ssh"), dir.path().join(".ssh/10.0.0.5")] {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o700, "{} should be 0700", path.display());
        }
    }

    #[test]
    fn test_invalid_arguments_rejected_before_any_work() {
        let dir = TempDir::new().unwrap();
        let setup = bootstrapper(&dir, RecordingRunner::new());

        let cases = [
            ("", "bob", "h"),
            ("alice", "", "h"),
            ("alice", "bob", ""),
            ("alice", "-oProxyCommand=x", "h"),
            ("alice", "bob", "../etc"),
            ("alice", "bob", ".."),
            ("alice", "bob cat", "h"),
            ("alice", "bob@x", "h"),
        ];
        for (git_user, remote_user, remote_host) in cases {
            let err = setup
                .authorize_localhost_to_access_remotehost(git_user, remote_user, remote_host)
                .unwrap_err();
            assert!(
                matches!(err, SetupError::InvalidArgument { .. }),
                "{git_user:?} {remote_user:?} {remote_host:?}"
            );
        }
        assert!(setup.runner().calls().is_empty());
        assert!(!dir.path().join(".ssh").exists());
    }
}
