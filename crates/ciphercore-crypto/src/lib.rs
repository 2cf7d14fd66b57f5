//! # ciphercore-crypto
//!
//! Key custody and message envelope cryptography for CipherCore.
//!
//! Each account owns an RSA keypair. The public key is stored in clear; the
//! private key is stored only wrapped under a key-encryption-key (KEK)
//! derived from the account password. Messages are encrypted under a fresh
//! per-message key that is wrapped for the receiver and signed by the sender.
//!
//! ## Cryptographic Primitives
//!
//! - **Key derivation**: PBKDF2-HMAC-SHA256 (≥100,000 iterations)
//! - **Key wrap / message cipher**: AES-256-GCM (AEAD, 96-bit random nonces)
//! - **Asymmetric keys**: RSA ≥2048-bit
//! - **Message key transport**: RSA-OAEP with SHA-256
//! - **Signatures**: RSA-PSS with SHA-256 over the SHA-256 content hash
//! - **Login passwords**: Argon2id PHC strings
//!
//! ## Data Flow
//!
//! ```text
//! register:  generate() ──► protect(password) ──► AccountKeyRecord (persisted)
//! send:      unlock(sender record) ──► seal(msg, sender_priv, receiver_pub)
//! read:      unlock(receiver record) ──► open(env, receiver_priv, sender_pub)
//! ```
//!
//! ## Examples
//!
//! ### Protect and Unlock a Keypair
//!
//! ```rust
//! use ciphercore_crypto::{protect, unlock, CryptoPolicy, Keypair};
//!
//! let policy = CryptoPolicy::minimum();
//! let keypair = Keypair::generate(&policy).unwrap();
//! let record = protect(&keypair, "Secret123!", &policy).unwrap();
//!
//! let private = unlock(&record, "Secret123!").unwrap();
//! assert_eq!(private.public_key(), keypair.public);
//! assert!(unlock(&record, "wrong").is_err());
//! ```
//!
//! ### Seal and Open a Message
//!
//! ```rust
//! use ciphercore_crypto::{open, seal, CryptoPolicy, Keypair};
//!
//! let policy = CryptoPolicy::minimum();
//! let alice = Keypair::generate(&policy).unwrap();
//! let bob = Keypair::generate(&policy).unwrap();
//!
//! let envelope = seal(b"hello", &alice.private, &bob.public).unwrap();
//! let opened = open(&envelope, &bob.private, &alice.public).unwrap();
//!
//! assert_eq!(opened.plaintext, b"hello");
//! assert!(opened.hash_valid && opened.signature_valid);
//! ```

pub mod cipher;
pub mod config;
pub mod envelope;
pub mod error;
pub mod format;
pub mod kdf;
pub mod keys;
pub mod keywrap;
pub mod password;

// Re-export commonly used types
pub use config::CryptoPolicy;
pub use envelope::{
    content_hash, integrity_warning, open, seal, MessageEnvelope, OpenedMessage,
};
pub use error::{CryptoError, CryptoResult, GENERIC_INTEGRITY_MESSAGE};
pub use format::{base64_decode, base64_encode};
pub use kdf::{derive_kek, derive_kek_with, DerivedKey};
pub use keys::{protect, rewrap, unlock, AccountKeyRecord, Keypair, PrivateKey, PublicKey};
pub use keywrap::{unwrap_key, wrap_key, WrappedKey};
pub use password::{hash_password, verify_password};
