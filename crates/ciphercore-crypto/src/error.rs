//! Error types for cryptographic operations.

use thiserror::Error;

/// Message shown to end users for every integrity failure.
pub const GENERIC_INTEGRITY_MESSAGE: &str = "incorrect password or corrupted data";

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Malformed input (bad lengths, empty password, weak policy).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// AEAD tag did not verify while unwrapping key material.
    ///
    /// Wrong password, wrong nonce and tampered ciphertext all end up here.
    #[error("Authentication failed - incorrect password or corrupted data")]
    AuthenticationFailure,

    /// The wrapped message key could not be recovered with the receiver's key.
    #[error("Message key unwrap failed")]
    KeyUnwrapFailure,

    /// The message ciphertext failed AEAD authentication.
    #[error("Message authentication failed - data may be tampered")]
    MessageAuthenticationFailure,

    /// Authenticated key bytes could not be parsed as a key.
    #[error("Malformed key material: {0}")]
    MalformedKeyMaterial(String),

    /// Keypair generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Login password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CryptoError {
    /// Whether this error is a failed integrity check.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::AuthenticationFailure
                | CryptoError::KeyUnwrapFailure
                | CryptoError::MessageAuthenticationFailure
        )
    }

    /// Text safe to hand to an external caller.
    ///
    /// Integrity failures all collapse into one message so a caller cannot
    /// tell which check rejected the input.
    pub fn public_message(&self) -> String {
        if self.is_integrity_failure() {
            GENERIC_INTEGRITY_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
