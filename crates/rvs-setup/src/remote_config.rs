// ABOUTME: Appends the rendered ssh_config.remote fragment to the remote ~/.ssh/config.
// ABOUTME: A grep-based presence check runs first so the fragment is added once.

use crate::config::RemoteCheckMode;
use crate::error::{Result, SetupError};
use crate::template;
use rvs_ssh::{shell_quote, RemoteAction, RemoteShell};
use std::path::Path;
use tracing::{info, warn};

/// Printed by the check script when the fragment is missing.
pub const NOT_FOUND_SENTINEL: &str = "NOT_FOUND";

/// Result of a remote config write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteConfigStatus {
    AlreadyPresent,
    Appended,
    /// The template rendered to nothing; no remote command was run.
    EmptyFragment,
}

/// Remote script that prints `NOT_FOUND` unless `fragment` is in ~/.ssh/config.
///
/// `ExactLine` hands the whole fragment to `grep -F` as one pattern. grep splits
/// a pattern on newlines, so a multi-line fragment matches if any single fragment
/// line is present, and a partially installed fragment is never completed.
/// `EveryLine` requires each non-blank line of the fragment to be present as a
/// whole line.
pub fn check_script(fragment: &str, mode: RemoteCheckMode) -> String {
    let sentinel = shell_quote(NOT_FOUND_SENTINEL);
    match mode {
        RemoteCheckMode::ExactLine => format!(
            "grep -qxF -e {} ~/.ssh/config || echo {sentinel}",
            shell_quote(fragment)
        ),
        RemoteCheckMode::EveryLine => {
            let greps: Vec<String> = fragment
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| format!("grep -qxF -e {} ~/.ssh/config", shell_quote(line)))
                .collect();
            format!("{{ {}; }} || echo {sentinel}", greps.join(" && "))
        }
    }
}

/// Remote script that appends `fragment` to ~/.ssh/config (dir 0700, file 0600).
pub fn update_script(fragment: &str) -> String {
    format!(
        "mkdir -p ~/.ssh && chmod 700 ~/.ssh && printf '%s\\n' {} >> ~/.ssh/config && chmod 600 ~/.ssh/config",
        shell_quote(fragment)
    )
}

/// Render `ssh_config.remote` for `git_user` and append it to the remote
/// ~/.ssh/config unless the check script reports it present.
///
/// # Errors
/// - `ReadFile` / `Template` if the template cannot be read or rendered.
/// - `RemoteCommand` if the check or the update command fails.
pub fn create_ssh_configuration_on_remotehost(
    shell: &RemoteShell<'_>,
    template_path: &Path,
    git_user: &str,
    mode: RemoteCheckMode,
) -> Result<RemoteConfigStatus> {
    let template = std::fs::read_to_string(template_path).map_err(|e| SetupError::ReadFile {
        path: template_path.to_path_buf(),
        source: e,
    })?;
    let rendered = template::render(&template, &[("git_user", git_user)]).map_err(|source| {
        SetupError::Template {
            path: template_path.to_path_buf(),
            source,
        }
    })?;

    // the append adds its own newline
    let fragment = rendered.trim_end_matches(&['\n', '\r'][..]);
    if fragment.trim().is_empty() {
        warn!(
            template = %template_path.display(),
            "Remote SSH configuration template is empty, nothing to append"
        );
        return Ok(RemoteConfigStatus::EmptyFragment);
    }

    let check = shell.run(RemoteAction::CheckConfig, &check_script(fragment, mode))?;
    if !check.stdout.contains(NOT_FOUND_SENTINEL) {
        info!(remote = %shell.target(), "Remote SSH configuration already exists");
        return Ok(RemoteConfigStatus::AlreadyPresent);
    }

    shell.run(RemoteAction::UpdateConfig, &update_script(fragment))?;
    info!(remote = %shell.target(), "Remote SSH configuration updated");
    Ok(RemoteConfigStatus::Appended)
}
