// ABOUTME: SSH plumbing for the rvs remote development bootstrap.
// ABOUTME: Key generation, public key installation, and remote command execution.

//! # rvs-ssh
//!
//! Everything that talks to OpenSSH tooling. No SSH protocol or key
//! cryptography is implemented here: keys come from `ssh-keygen` and remote
//! commands go through the `ssh` client, both behind the [`CommandRunner`]
//! seam so they can be replaced in tests.
//!
//! ## Example
//!
//! ```no_run
//! use rvs_ssh::{
//!     add_public_key_to_remote, generate_key_pair, public_key_path, KeyType, RemoteShell,
//!     RemoteTarget, SystemRunner, DEFAULT_KEYGEN_PROGRAM, DEFAULT_SSH_PROGRAM,
//! };
//! use std::path::Path;
//!
//! let key_path = Path::new("/home/alice/.ssh/10.0.0.5/id_ed25519");
//! generate_key_pair(&SystemRunner, DEFAULT_KEYGEN_PROGRAM, KeyType::Ed25519, key_path, "10.0.0.5@laptop")
//!     .expect("key should generate");
//!
//! let target = RemoteTarget::new("bob", "10.0.0.5");
//! let shell = RemoteShell::new(&SystemRunner, DEFAULT_SSH_PROGRAM, &target);
//! add_public_key_to_remote(&shell, &public_key_path(key_path), false).expect("key should install");
//! ```

mod authorized_keys;
mod error;
mod exec;
mod fingerprint;
mod key;
mod remote;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use authorized_keys::{add_public_key_to_remote, install_script};
pub use error::{ErrorCategory, Result, SshError};
pub use exec::{CommandOutput, CommandRunner, SystemRunner};
pub use fingerprint::compute_fingerprint;
pub use key::{
    generate_key_pair, keygen_args, public_key_path, read_public_key, KeyType, PublicKeyLine,
    DEFAULT_KEYGEN_PROGRAM, SUPPORTED_KEY_TYPES,
};
pub use remote::{shell_quote, RemoteAction, RemoteShell, RemoteTarget, DEFAULT_SSH_PROGRAM};

// Re-export ssh_key types for convenience
pub use ssh_key::PublicKey;
