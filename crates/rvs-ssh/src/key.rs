// ABOUTME: SSH key type selection and key pair generation through ssh-keygen.
// ABOUTME: Also reads and validates the generated OpenSSH public key.

use crate::error::{Result, SshError};
use crate::exec::CommandRunner;
use ssh_key::PublicKey;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Default key generation executable.
pub const DEFAULT_KEYGEN_PROGRAM: &str = "ssh-keygen";

/// Key derivation rounds passed to `ssh-keygen -a`.
const KDF_ROUNDS: &str = "100";

/// Key algorithms the tool knows how to request from ssh-keygen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyType {
    Rsa,
    #[default]
    Ed25519,
}

/// Every supported key type, in the order they are reported to users.
pub const SUPPORTED_KEY_TYPES: [KeyType; 2] = [KeyType::Rsa, KeyType::Ed25519];

impl KeyType {
    /// Name as understood by `ssh-keygen -t`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Ed25519 => "ed25519",
        }
    }

    /// Private key file name, e.g. `id_ed25519`.
    pub fn file_name(&self) -> String {
        format!("id_{}", self.as_str())
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = SshError;

    fn from_str(s: &str) -> Result<Self> {
        SUPPORTED_KEY_TYPES
            .into_iter()
            .find(|kt| kt.as_str() == s)
            .ok_or_else(|| SshError::UnsupportedKeyType(s.to_string()))
    }
}

/// Path of the public half of a key pair: `<key_path>.pub`.
pub fn public_key_path(key_path: &Path) -> PathBuf {
    let mut path = key_path.as_os_str().to_owned();
    path.push(".pub");
    PathBuf::from(path)
}

/// Arguments for a non-interactive, passphrase-less ssh-keygen run.
pub fn keygen_args(key_type: KeyType, key_path: &Path, comment: &str) -> Vec<String> {
    vec![
        "-o".to_string(),
        "-a".to_string(),
        KDF_ROUNDS.to_string(),
        "-t".to_string(),
        key_type.as_str().to_string(),
        "-f".to_string(),
        key_path.to_string_lossy().into_owned(),
        "-C".to_string(),
        comment.to_string(),
        "-q".to_string(),
        "-N".to_string(),
        String::new(),
    ]
}

/// Generate a key pair at `key_path` by running the key generation tool.
///
/// The caller is responsible for checking that no key exists yet; ssh-keygen
/// would otherwise stop to ask about overwriting it.
///
/// # Errors
/// - `ToolNotFound` if `keygen_program` is not on PATH.
/// - `KeyGeneration` if the tool exits non-zero or leaves either file missing.
pub fn generate_key_pair(
    runner: &dyn CommandRunner,
    keygen_program: &str,
    key_type: KeyType,
    key_path: &Path,
    comment: &str,
) -> Result<()> {
    if runner.locate(keygen_program).is_none() {
        return Err(SshError::ToolNotFound {
            program: keygen_program.to_string(),
        });
    }

    let output = runner.run(keygen_program, &keygen_args(key_type, key_path, comment))?;
    if !output.success() {
        return Err(SshError::KeyGeneration {
            path: key_path.to_path_buf(),
            message: format!("{} ({})", output.diagnostic(), output.status()),
        });
    }

    for path in [key_path.to_path_buf(), public_key_path(key_path)] {
        if !path.exists() {
            return Err(SshError::KeyGeneration {
                path: key_path.to_path_buf(),
                message: format!(
                    "{keygen_program} reported success but {} is missing",
                    path.display()
                ),
            });
        }
    }

    info!(key_path = %key_path.display(), %key_type, "SSH key pair generated successfully");
    Ok(())
}

/// A public key as read from a `.pub` file.
#[derive(Debug, Clone)]
pub struct PublicKeyLine {
    /// Trimmed file content, exactly as it goes into authorized_keys.
    pub line: String,
    pub key: PublicKey,
}

/// Read and validate an OpenSSH public key file.
///
/// # Errors
/// - `KeyNotFound` if the file does not exist.
/// - `ReadKey` if it cannot be read.
/// - `InvalidPublicKey` if the content is not an OpenSSH public key.
pub fn read_public_key(path: &Path) -> Result<PublicKeyLine> {
    if !path.exists() {
        return Err(SshError::KeyNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| SshError::ReadKey {
        path: path.to_path_buf(),
        source: e,
    })?;
    let line = content.trim().to_string();

    let key = PublicKey::from_openssh(&line).map_err(|e| SshError::InvalidPublicKey {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(PublicKeyLine { line, key })
}
