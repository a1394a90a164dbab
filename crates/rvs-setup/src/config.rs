// ABOUTME: Runtime configuration for rvs-setup.
// ABOUTME: Optional TOML file with home-relative defaults and shell-style path expansion.

use crate::error::{Result, SetupError};
use rvs_ssh::{KeyType, DEFAULT_KEYGEN_PROGRAM, DEFAULT_SSH_PROGRAM};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "RVS_SETUP_CONFIG";

/// Client-side template for the per-host config fragment.
pub const LOCAL_TEMPLATE_NAME: &str = "ssh_config.local";

/// Template for the fragment appended to the remote ~/.ssh/config.
pub const REMOTE_TEMPLATE_NAME: &str = "ssh_config.remote";

/// How the remote config writer decides the fragment is already installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemoteCheckMode {
    /// `grep -qxF -e '<fragment>'`: matches if any single fragment line is present.
    #[default]
    ExactLine,
    /// Every non-blank line of the fragment must appear as a whole line.
    EveryLine,
}

/// On-disk shape of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    ssh_dir: Option<String>,
    template_dir: Option<String>,
    key_type: Option<String>,
    ssh_program: Option<String>,
    keygen_program: Option<String>,
    remote_check: Option<RemoteCheckMode>,
    dedupe_authorized_keys: Option<bool>,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConfig {
    /// Local SSH directory (`~/.ssh`).
    pub ssh_dir: PathBuf,
    /// Directory holding `ssh_config.local` and `ssh_config.remote`.
    pub template_dir: PathBuf,
    pub key_type: KeyType,
    pub ssh_program: String,
    pub keygen_program: String,
    pub remote_check: RemoteCheckMode,
    /// Skip the authorized_keys append when the key line is already present.
    pub dedupe_authorized_keys: bool,
}

impl SetupConfig {
    /// Defaults for a user whose home directory is `home`.
    pub fn with_home(home: &Path) -> Self {
        Self {
            ssh_dir: home.join(".ssh"),
            template_dir: PathBuf::from("."),
            key_type: KeyType::default(),
            ssh_program: DEFAULT_SSH_PROGRAM.to_string(),
            keygen_program: DEFAULT_KEYGEN_PROGRAM.to_string(),
            remote_check: RemoteCheckMode::default(),
            dedupe_authorized_keys: false,
        }
    }

    /// Default config file location (`~/.config/rvs/setup.toml` on Linux).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rvs").join("setup.toml"))
    }

    /// Load configuration for the current user.
    ///
    /// Reads `$RVS_SETUP_CONFIG` if set (the file must exist), otherwise the
    /// default location if it exists, otherwise returns defaults.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().ok_or(SetupError::HomeDirectory)?;

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path), &home);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path, &home),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::with_home(&home))
            }
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path, home: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SetupError::Config(format!("Failed to read config from {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loading configuration");
        Self::from_toml(&contents, home)
    }

    /// Parse configuration text, filling unset keys with defaults.
    pub fn from_toml(contents: &str, home: &Path) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| SetupError::Config(format!("Failed to parse config: {}", e)))?;

        let mut config = Self::with_home(home);
        if let Some(dir) = file.ssh_dir {
            config.ssh_dir = expand_path(&dir, home)?;
        }
        if let Some(dir) = file.template_dir {
            config.template_dir = expand_path(&dir, home)?;
        }
        if let Some(key_type) = file.key_type {
            config.key_type = key_type.parse()?;
        }
        if let Some(program) = file.ssh_program {
            config.ssh_program = non_empty("ssh_program", program)?;
        }
        if let Some(program) = file.keygen_program {
            config.keygen_program = non_empty("keygen_program", program)?;
        }
        if let Some(mode) = file.remote_check {
            config.remote_check = mode;
        }
        if let Some(dedupe) = file.dedupe_authorized_keys {
            config.dedupe_authorized_keys = dedupe;
        }

        Ok(config)
    }

    pub fn local_template_path(&self) -> PathBuf {
        self.template_dir.join(LOCAL_TEMPLATE_NAME)
    }

    pub fn remote_template_path(&self) -> PathBuf {
        self.template_dir.join(REMOTE_TEMPLATE_NAME)
    }
}

fn non_empty(key: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(SetupError::Config(format!("{key} must not be empty")));
    }
    Ok(value)
}

/// Expand `~` and `$VAR` in a configured path.
fn expand_path(value: &str, home: &Path) -> Result<PathBuf> {
    let expanded = shellexpand::full_with_context(
        value,
        || home.to_str(),
        |var: &str| std::env::var(var).map(Some),
    )
    .map_err(|e| SetupError::Config(format!("Failed to expand path '{}': {}", value, e)))?;
    Ok(PathBuf::from(expanded.into_owned()))
}
