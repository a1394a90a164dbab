// ABOUTME: SSH public key fingerprint computation.
// ABOUTME: Produces the same SHA256:<base64> form that `ssh-keygen -lf` prints.

use crate::error::{Result, SshError};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use ssh_key::PublicKey;

/// Compute the OpenSSH-style SHA256 fingerprint of a public key.
///
/// The hash covers the key blob in SSH wire format (algorithm name and key
/// data as length-prefixed strings), without the comment. The digest is
/// base64 encoded without padding and prefixed with `SHA256:`.
///
/// # Errors
/// Returns `SshError::SerializeKey` if the key cannot be encoded.
pub fn compute_fingerprint(public_key: &PublicKey) -> Result<String> {
    let wire_data = public_key.to_bytes().map_err(SshError::SerializeKey)?;

    let mut hasher = Sha256::new();
    hasher.update(&wire_data);
    let hash = hasher.finalize();

    Ok(format!("SHA256:{}", STANDARD_NO_PAD.encode(hash)))
}
