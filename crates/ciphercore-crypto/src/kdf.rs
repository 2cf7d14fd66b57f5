//! Password-based KEK derivation using PBKDF2-HMAC-SHA256.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::{CryptoPolicy, MAX_KDF_ITERATIONS, MIN_KDF_ITERATIONS, MIN_SALT_LEN};
use crate::error::{CryptoError, CryptoResult};

/// Bounds on the derived key length, in bytes.
const MIN_OUTPUT_LEN: usize = 16;
const MAX_OUTPUT_LEN: usize = 64;

/// Key-encryption-key with automatic zeroization on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: Vec<u8>,
}

impl DerivedKey {
    /// Create a derived key from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { key: bytes }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a KEK from a password and salt.
///
/// Identical inputs always produce the identical key, so the KEK can be
/// re-derived at every unlock without ever being stored.
///
/// # Errors
///
/// `InvalidParameter` for an empty password, a salt shorter than 16 bytes,
/// an iteration count outside 100,000..=10,000,000, or an output length
/// outside 16..=64.
pub fn derive_kek(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> CryptoResult<DerivedKey> {
    if password.is_empty() {
        return Err(CryptoError::InvalidParameter(
            "password must not be empty".into(),
        ));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::InvalidParameter(format!(
            "salt must be at least {} bytes, got {}",
            MIN_SALT_LEN,
            salt.len()
        )));
    }
    if !(MIN_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&iterations) {
        return Err(CryptoError::InvalidParameter(format!(
            "iterations must be between {} and {}, got {}",
            MIN_KDF_ITERATIONS, MAX_KDF_ITERATIONS, iterations
        )));
    }
    if !(MIN_OUTPUT_LEN..=MAX_OUTPUT_LEN).contains(&output_len) {
        return Err(CryptoError::InvalidParameter(format!(
            "output length {} out of range",
            output_len
        )));
    }

    let mut key = vec![0u8; output_len];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);

    Ok(DerivedKey { key })
}

/// Derive a KEK using the iteration count and length from `policy`.
pub fn derive_kek_with(
    password: &[u8],
    salt: &[u8],
    policy: &CryptoPolicy,
) -> CryptoResult<DerivedKey> {
    derive_kek(password, salt, policy.kdf_iterations, policy.kek_len)
}
