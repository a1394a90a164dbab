// ABOUTME: Installs the local public key into the remote authorized_keys file.
// ABOUTME: One ssh round trip that creates ~/.ssh (0700) and appends the key (0600).

use crate::error::Result;
use crate::fingerprint::compute_fingerprint;
use crate::key::read_public_key;
use crate::remote::{shell_quote, RemoteAction, RemoteShell};
use std::path::Path;
use tracing::info;

/// Remote script that appends `key_line` to `~/.ssh/authorized_keys`.
///
/// With `dedupe` the append is skipped when the exact line is already there.
pub fn install_script(key_line: &str, dedupe: bool) -> String {
    let quoted = shell_quote(key_line);
    let append = format!("printf '%s\\n' {quoted} >> ~/.ssh/authorized_keys");
    let append = if dedupe {
        format!("{{ grep -qxF -e {quoted} ~/.ssh/authorized_keys 2>/dev/null || {append}; }}")
    } else {
        append
    };

    format!("mkdir -p ~/.ssh && chmod 700 ~/.ssh && {append} && chmod 600 ~/.ssh/authorized_keys")
}

/// Append the public key at `public_key_path` to the remote authorized_keys.
///
/// Without `dedupe`, repeated calls add repeated lines.
///
/// # Errors
/// - `KeyNotFound` if the public key file is missing; no remote command runs.
/// - `InvalidPublicKey` / `ReadKey` if the file cannot be used.
/// - `RemoteCommand` if ssh fails, including authentication failures.
pub fn add_public_key_to_remote(
    shell: &RemoteShell<'_>,
    public_key_path: &Path,
    dedupe: bool,
) -> Result<()> {
    let public_key = read_public_key(public_key_path)?;
    let fingerprint = compute_fingerprint(&public_key.key)?;

    shell.run(
        RemoteAction::InstallPublicKey,
        &install_script(&public_key.line, dedupe),
    )?;

    info!(
        remote = %shell.target(),
        %fingerprint,
        "Public key added to the remote authorized_keys"
    );
    Ok(())
}
