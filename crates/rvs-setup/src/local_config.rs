// ABOUTME: Writes the per-host SSH client config fragment on this machine.
// ABOUTME: Links it into ~/.ssh/config through a marker-delimited Include block.

use crate::error::{Result, SetupError};
use crate::template;
use rvs_ssh::SshError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker line placed above and below the Include directive.
pub const INCLUDE_MARKER: &str = "# AUTOGENERATED BY USER";

/// Inputs for one local config write.
#[derive(Debug, Clone)]
pub struct LocalConfigRequest<'a> {
    /// Private key the fragment points at; must exist.
    pub key_path: &'a Path,
    pub git_user: &'a str,
    pub remote_host: &'a str,
    /// `ssh_config.local` template.
    pub template_path: &'a Path,
    /// Where the rendered fragment goes (`<ssh_dir>/<remote_host>/config`).
    pub fragment_path: &'a Path,
    /// The user's global client config (`<ssh_dir>/config`).
    pub global_config_path: &'a Path,
}

/// The three-line block that pulls `fragment_path` into the global config.
pub fn include_block(fragment_path: &Path) -> String {
    format!(
        "{INCLUDE_MARKER}\nInclude {}\n{INCLUDE_MARKER}\n",
        fragment_path.display()
    )
}

/// Compute the new global config content.
///
/// Returns `None` when `existing` already contains the block. Otherwise the
/// block is prepended (separated by a blank line), or becomes the whole file
/// when there is no existing config.
pub fn merge_include(existing: Option<&str>, block: &str) -> Option<String> {
    match existing {
        Some(content) if content.contains(block.trim()) => None,
        Some(content) => Some(format!("{block}\n{content}")),
        None => Some(block.to_string()),
    }
}

/// Render the client fragment and make sure the global config includes it.
///
/// # Errors
/// - `KeyNotFound` if the private key is missing.
/// - `ReadFile` / `WriteFile` / `CreateDirectory` for any file failure.
/// - `Template` if the template has unknown placeholders.
pub fn create_ssh_configuration_on_localhost(request: &LocalConfigRequest<'_>) -> Result<()> {
    if !request.key_path.exists() {
        return Err(SshError::KeyNotFound {
            path: request.key_path.to_path_buf(),
        }
        .into());
    }

    let template = read_file(request.template_path)?;
    let key_path = request.key_path.to_string_lossy();
    let fragment = template::render(
        &template,
        &[
            ("git_user", request.git_user),
            ("remote_host", request.remote_host),
            ("key_path", key_path.as_ref()),
        ],
    )
    .map_err(|source| SetupError::Template {
        path: request.template_path.to_path_buf(),
        source,
    })?;

    write_file(request.fragment_path, &fragment)?;
    info!(
        path = %request.fragment_path.display(),
        "Local SSH configuration written"
    );

    include_in_global_config(request.global_config_path, request.fragment_path)
}

/// Prepend the Include block for `fragment_path` to the global config unless
/// it is already there.
pub fn include_in_global_config(global_config_path: &Path, fragment_path: &Path) -> Result<()> {
    let existing = if global_config_path.exists() {
        Some(read_file(global_config_path)?)
    } else {
        None
    };

    match merge_include(existing.as_deref(), &include_block(fragment_path)) {
        None => {
            info!(
                fragment = %fragment_path.display(),
                global = %global_config_path.display(),
                "Local SSH configuration already included"
            );
        }
        Some(content) => {
            write_file(global_config_path, &content)?;
            info!(
                fragment = %fragment_path.display(),
                global = %global_config_path.display(),
                "Included local SSH configuration in global SSH configuration"
            );
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| SetupError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SetupError::CreateDirectory {
            path: PathBuf::from(parent),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| SetupError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}
