//! Error types for CipherCore services.

use ciphercore_crypto::CryptoError;
use thiserror::Error;

/// Result type alias using CipherCore's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for account and messaging operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Cryptographic operation failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// Message not found
    #[error("Message not found: {0}")]
    MessageNotFound(i64),

    /// Username already registered
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Login rejected
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Authenticated but not allowed to touch this record
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Storage collaborator failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (blocking task panicked or was cancelled)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Text safe to return to an external caller.
    ///
    /// Cryptographic integrity failures collapse into one generic message.
    pub fn public_message(&self) -> String {
        match self {
            Error::Crypto(e) => e.public_message(),
            other => other.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciphercore_crypto::GENERIC_INTEGRITY_MESSAGE;

    #[test]
    fn test_crypto_integrity_errors_are_generic() {
        let err: Error = CryptoError::KeyUnwrapFailure.into();
        assert_eq!(err.public_message(), GENERIC_INTEGRITY_MESSAGE);

        let err: Error = CryptoError::MessageAuthenticationFailure.into();
        assert_eq!(err.public_message(), GENERIC_INTEGRITY_MESSAGE);
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = Error::AccountNotFound(7);
        assert!(err.public_message().contains('7'));
    }

    #[test]
    fn test_json_error_maps_to_storage() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Storage(_)));
    }
}
