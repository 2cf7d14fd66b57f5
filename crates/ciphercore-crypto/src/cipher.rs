//! AES-256-GCM cipher operations and secure randomness.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// AES-GCM nonce length (96 bits).
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random salt of `len` bytes.
pub fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Generate a random nonce (12 bytes).
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    generate_random()
}

fn new_cipher(key: &[u8]) -> CryptoResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key).map_err(|_| {
        CryptoError::InvalidParameter(format!("AES-256 key must be 32 bytes, got {}", key.len()))
    })
}

/// Encrypt plaintext with AES-256-GCM.
///
/// Returns ciphertext with appended authentication tag (16 bytes).
pub fn aes_gcm_encrypt(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = new_cipher(key)?;

    let nonce = Nonce::from_slice(nonce);

    cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))
}

/// Decrypt ciphertext with AES-256-GCM.
///
/// The ciphertext must include the authentication tag (16 bytes) at the end.
/// A tag mismatch yields `AuthenticationFailure` and no plaintext.
pub fn aes_gcm_decrypt(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = new_cipher(key)?;

    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailure)
}

/// Convert a stored nonce into the fixed-size array AES-GCM expects.
pub fn nonce_from_slice(bytes: &[u8]) -> CryptoResult<[u8; NONCE_LEN]> {
    bytes.try_into().map_err(|_| {
        CryptoError::InvalidParameter(format!(
            "nonce must be {} bytes, got {}",
            NONCE_LEN,
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt(16);
        let salt2 = generate_salt(16);

        assert_eq!(salt1.len(), 16);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();

        assert_eq!(nonce1.len(), 12);
        assert_ne!(nonce1, nonce2);
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];
        let plaintext = b"Hello, World!";

        let ciphertext = aes_gcm_encrypt(&key, &nonce, plaintext).unwrap();
        let decrypted = aes_gcm_decrypt(&key, &nonce, &ciphertext).unwrap();

        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_ciphertext_carries_tag() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];
        let plaintext = b"Hello, World!";

        let ciphertext = aes_gcm_encrypt(&key, &nonce, plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let nonce = [1u8; 12];
        let ciphertext = aes_gcm_encrypt(&[42u8; 32], &nonce, b"Secret data").unwrap();
        let result = aes_gcm_decrypt(&[99u8; 32], &nonce, &ciphertext);

        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_decrypt_wrong_nonce() {
        let key = [42u8; 32];
        let ciphertext = aes_gcm_encrypt(&key, &[1u8; 12], b"Secret data").unwrap();
        let result = aes_gcm_decrypt(&key, &[2u8; 12], &ciphertext);

        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_decrypt_tampered_ciphertext() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];
        let mut ciphertext = aes_gcm_encrypt(&key, &nonce, b"Secret data").unwrap();

        ciphertext[0] ^= 0xFF;

        let result = aes_gcm_decrypt(&key, &nonce, &ciphertext);
        assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
    }

    #[test]
    fn test_encrypt_rejects_short_key() {
        let result = aes_gcm_encrypt(&[0u8; 16], &[0u8; 12], b"data");
        assert!(matches!(result, Err(CryptoError::InvalidParameter(_))));
    }

    #[test]
    fn test_encrypt_empty_plaintext() {
        let key = [42u8; 32];
        let nonce = [1u8; 12];

        let ciphertext = aes_gcm_encrypt(&key, &nonce, b"").unwrap();
        let decrypted = aes_gcm_decrypt(&key, &nonce, &ciphertext).unwrap();

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_nonce_from_slice() {
        assert!(nonce_from_slice(&[0u8; 12]).is_ok());
        assert!(matches!(
            nonce_from_slice(&[0u8; 16]),
            Err(CryptoError::InvalidParameter(_))
        ));
    }
}
