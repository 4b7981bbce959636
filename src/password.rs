//! One-way password digests (Argon2id, PHC string format).

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::error::{Error, Result};
use crate::secret::Secret;

/// Hashes `plaintext` with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<Secret<String>> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| Error::Password(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| Error::Password(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| Error::Password(e.to_string()))?
        .to_string();
    Ok(Secret::new(phc))
}

/// Checks `plaintext` against a stored digest.
///
/// The digest comparison inside `password-hash` is constant-time. An empty
/// or unparseable digest never verifies.
pub fn verify_password(digest: &Secret<String>, plaintext: &str) -> bool {
    match PasswordHash::new(digest.expose_secret()) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
