//! Key custody policy shared by every keypair and KDF call.

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Lowest PBKDF2 iteration count accepted anywhere.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Highest PBKDF2 iteration count accepted anywhere, stored records included.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// KEK length in bytes (AES-256).
pub const KEK_LEN: usize = 32;

/// Shortest accepted per-account salt.
pub const MIN_SALT_LEN: usize = 16;

/// Smallest accepted RSA modulus.
pub const MIN_RSA_BITS: usize = 2048;

/// Env var overriding the PBKDF2 iteration count.
pub const ENV_KDF_ITERATIONS: &str = "CIPHERCORE_KDF_ITERATIONS";
/// Env var overriding the RSA modulus size.
pub const ENV_RSA_BITS: &str = "CIPHERCORE_RSA_BITS";
/// Env var overriding the salt length.
pub const ENV_SALT_LEN: &str = "CIPHERCORE_SALT_LEN";

/// Key derivation and key size parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CryptoPolicy {
    /// PBKDF2-HMAC-SHA256 iterations (default: 600,000).
    pub kdf_iterations: u32,
    /// Derived KEK length in bytes (always 32).
    pub kek_len: usize,
    /// Per-account salt length in bytes (default: 16).
    pub salt_len: usize,
    /// RSA modulus size in bits (default: 2048).
    pub rsa_bits: usize,
}

impl Default for CryptoPolicy {
    fn default() -> Self {
        Self {
            kdf_iterations: 600_000,
            kek_len: KEK_LEN,
            salt_len: MIN_SALT_LEN,
            rsa_bits: MIN_RSA_BITS,
        }
    }
}

impl CryptoPolicy {
    /// The weakest policy still accepted (used for tests and low-power hosts).
    pub fn minimum() -> Self {
        Self {
            kdf_iterations: MIN_KDF_ITERATIONS,
            ..Self::default()
        }
    }

    /// Parameters for long-lived, high-value accounts.
    pub fn high_security() -> Self {
        Self {
            kdf_iterations: 1_000_000,
            kek_len: KEK_LEN,
            salt_len: 32,
            rsa_bits: 3072,
        }
    }

    /// Defaults overlaid with `CIPHERCORE_*` environment variables.
    pub fn from_env() -> CryptoResult<Self> {
        let mut policy = Self::default();
        if let Some(v) = env_parse::<u32>(ENV_KDF_ITERATIONS)? {
            policy.kdf_iterations = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_RSA_BITS)? {
            policy.rsa_bits = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_SALT_LEN)? {
            policy.salt_len = v;
        }
        policy.validate()?;
        tracing::debug!(
            kdf_iterations = policy.kdf_iterations,
            rsa_bits = policy.rsa_bits,
            salt_len = policy.salt_len,
            "Crypto policy loaded"
        );
        Ok(policy)
    }

    /// Reject parameters outside the accepted range.
    pub fn validate(&self) -> CryptoResult<()> {
        if !(MIN_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&self.kdf_iterations) {
            return Err(CryptoError::InvalidParameter(format!(
                "kdf_iterations must be between {} and {}",
                MIN_KDF_ITERATIONS, MAX_KDF_ITERATIONS
            )));
        }
        if self.kek_len != KEK_LEN {
            return Err(CryptoError::InvalidParameter(format!(
                "kek_len must be {}",
                KEK_LEN
            )));
        }
        if self.salt_len < MIN_SALT_LEN {
            return Err(CryptoError::InvalidParameter(format!(
                "salt_len must be at least {}",
                MIN_SALT_LEN
            )));
        }
        if self.rsa_bits < MIN_RSA_BITS {
            return Err(CryptoError::InvalidParameter(format!(
                "rsa_bits must be at least {}",
                MIN_RSA_BITS
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> CryptoResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CryptoError::InvalidParameter(format!("{} is not a number", name))),
        Err(_) => Ok(None),
    }
}
