//! Hybrid message envelopes: seal for a receiver, open and verify on read.
//!
//! # Seal
//!
//! 1. Generate a random 256-bit message key and 96-bit nonce
//! 2. Encrypt the plaintext with AES-256-GCM under the message key
//! 3. Wrap the message key for the receiver with RSA-OAEP (SHA-256)
//! 4. Hash the plaintext with SHA-256
//! 5. Sign the hash with the sender's key using RSA-PSS (SHA-256)
//!
//! # Open
//!
//! 1. Unwrap the message key with the receiver's private key
//! 2. Decrypt and authenticate the ciphertext
//! 3. Recompute the plaintext hash and compare it with the stored one
//! 4. Verify the signature over the stored hash with the sender's public key
//!
//! Failures in open steps 1-2 are errors and release no plaintext. Steps 3-4
//! are reported as `hash_valid` / `signature_valid` so a message with a bad
//! signature is still shown, with a warning.

use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::cipher::{aes_gcm_decrypt, aes_gcm_encrypt, generate_nonce, generate_random, NONCE_LEN};
use crate::error::{CryptoError, CryptoResult};
use crate::format::base64_bytes;
use crate::keys::{PrivateKey, PublicKey};

/// Message key length (AES-256).
pub const MESSAGE_KEY_LEN: usize = 32;

/// SHA-256 digest length.
pub const HASH_LEN: usize = 32;

/// Everything persisted for one message besides routing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// AES-256-GCM ciphertext with tag.
    #[serde(rename = "encrypted_message", with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    /// Message key encrypted for the receiver with RSA-OAEP.
    #[serde(rename = "encrypted_aes_key", with = "base64_bytes")]
    pub wrapped_message_key: Vec<u8>,
    #[serde(rename = "iv", with = "base64_bytes")]
    pub nonce: [u8; NONCE_LEN],
    /// SHA-256 of the plaintext at seal time.
    #[serde(rename = "message_hash", with = "base64_bytes")]
    pub content_hash: [u8; HASH_LEN],
    /// RSA-PSS signature over `content_hash` by the sender.
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

/// Result of a successful [`open`].
pub struct OpenedMessage {
    pub plaintext: Vec<u8>,
    /// Recomputed plaintext hash matches the stored one.
    pub hash_valid: bool,
    /// Signature over the stored hash verifies with the sender's key.
    pub signature_valid: bool,
}

impl OpenedMessage {
    /// Both integrity findings passed.
    pub fn is_verified(&self) -> bool {
        self.hash_valid && self.signature_valid
    }

    /// User-facing warning when a finding failed.
    pub fn warning(&self) -> Option<&'static str> {
        integrity_warning(self.hash_valid, self.signature_valid)
    }
}

/// Warning text for a pair of integrity findings, `None` when both passed.
pub fn integrity_warning(hash_valid: bool, signature_valid: bool) -> Option<&'static str> {
    match (hash_valid, signature_valid) {
        (true, true) => None,
        (false, true) => Some("message hash does not match its content"),
        (true, false) => Some("sender signature is invalid"),
        (false, false) => Some("message hash and sender signature are both invalid"),
    }
}

impl std::fmt::Debug for OpenedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedMessage")
            .field("plaintext_len", &self.plaintext.len())
            .field("hash_valid", &self.hash_valid)
            .field("signature_valid", &self.signature_valid)
            .finish()
    }
}

/// SHA-256 of `plaintext`.
pub fn content_hash(plaintext: &[u8]) -> [u8; HASH_LEN] {
    Sha256::digest(plaintext).into()
}

/// Sign a content hash with RSA-PSS/SHA-256.
pub fn sign_hash(key: &PrivateKey, hash: &[u8]) -> CryptoResult<Vec<u8>> {
    let signing_key = SigningKey::<Sha256>::new(key.as_rsa().clone());
    let signature = signing_key
        .try_sign_with_rng(&mut rand::thread_rng(), hash)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(signature.to_vec())
}

/// Check an RSA-PSS/SHA-256 signature over a content hash.
pub fn verify_hash_signature(key: &PublicKey, hash: &[u8], signature: &[u8]) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(key.as_rsa().clone())
        .verify(hash, &signature)
        .is_ok()
}

/// Encrypt and sign `plaintext` from `sender` to `receiver`.
pub fn seal(
    plaintext: &[u8],
    sender: &PrivateKey,
    receiver: &PublicKey,
) -> CryptoResult<MessageEnvelope> {
    let mut rng = rand::thread_rng();

    let message_key = Zeroizing::new(generate_random::<MESSAGE_KEY_LEN>());
    let nonce = generate_nonce();

    let ciphertext = aes_gcm_encrypt(message_key.as_slice(), &nonce, plaintext)?;

    let wrapped_message_key = receiver
        .as_rsa()
        .encrypt(&mut rng, Oaep::new::<Sha256>(), message_key.as_slice())
        .map_err(|e| CryptoError::Encryption(format!("RSA-OAEP wrap failed: {}", e)))?;

    let content_hash = content_hash(plaintext);
    let signature = sign_hash(sender, &content_hash)?;

    Ok(MessageEnvelope {
        ciphertext,
        wrapped_message_key,
        nonce,
        content_hash,
        signature,
    })
}

/// Decrypt an envelope and report its integrity findings.
///
/// # Errors
///
/// - `KeyUnwrapFailure` if the message key cannot be recovered (wrong
///   receiver key or tampered wrapped key).
/// - `MessageAuthenticationFailure` if the ciphertext fails AEAD
///   authentication.
///
/// A hash mismatch or bad signature is not an error; see [`OpenedMessage`].
/// Callers mark the message read only when this returns `Ok`.
pub fn open(
    envelope: &MessageEnvelope,
    receiver: &PrivateKey,
    sender: &PublicKey,
) -> CryptoResult<OpenedMessage> {
    let mut rng = rand::thread_rng();

    let message_key = receiver
        .as_rsa()
        .decrypt_blinded(&mut rng, Oaep::new::<Sha256>(), &envelope.wrapped_message_key)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::KeyUnwrapFailure)?;

    if message_key.len() != MESSAGE_KEY_LEN {
        return Err(CryptoError::KeyUnwrapFailure);
    }

    let plaintext = aes_gcm_decrypt(&message_key, &envelope.nonce, &envelope.ciphertext)
        .map_err(|e| match e {
            CryptoError::AuthenticationFailure => CryptoError::MessageAuthenticationFailure,
            other => other,
        })?;

    let hash_valid = content_hash(&plaintext) == envelope.content_hash;
    let signature_valid =
        verify_hash_signature(sender, &envelope.content_hash, &envelope.signature);

    if !hash_valid || !signature_valid {
        tracing::warn!(
            subsystem = "crypto",
            op = "open",
            hash_valid,
            signature_valid,
            "Message decrypted with failed integrity findings"
        );
    }

    Ok(OpenedMessage {
        plaintext,
        hash_valid,
        signature_valid,
    })
}
