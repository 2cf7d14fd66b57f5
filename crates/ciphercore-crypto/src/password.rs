//! Login password hashing (Argon2id, PHC string format).
//!
//! Independent of key custody: the stored hash only answers "is this the
//! account's password", it never feeds the KEK derivation.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{CryptoError, CryptoResult};

/// Hash a login password into a PHC string.
pub fn hash_password(password: &str) -> CryptoResult<String> {
    if password.is_empty() {
        return Err(CryptoError::InvalidParameter(
            "password must not be empty".into(),
        ));
    }
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))
}

/// Check a login password against a stored PHC string.
///
/// A malformed stored hash is an error; a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> CryptoResult<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
