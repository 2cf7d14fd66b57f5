//! RSA keypair lifecycle: generation, serialization and password custody.
//!
//! This module provides:
//! - Keypair generation (RSA, 2048-bit minimum)
//! - PEM serialization (SPKI for public keys, PKCS#8 for private keys)
//! - Password-protected private key records (PBKDF2 + AES-256-GCM)
//!
//! # Security
//!
//! - Private keys are zeroized on drop
//! - Serialized private key PEM only lives in zeroizing buffers
//! - The stored record never contains the KEK or the clear private key

use std::path::Path;

use rsa::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::cipher::{generate_salt, NONCE_LEN};
use crate::config::{CryptoPolicy, KEK_LEN, MIN_RSA_BITS};
use crate::error::{CryptoError, CryptoResult};
use crate::format::base64_bytes;
use crate::kdf::{derive_kek, derive_kek_with};
use crate::keywrap::{unwrap_key, wrap_key};

/// RSA public key.
///
/// Public keys are stored in clear and used by senders to wrap message keys
/// and by readers to verify signatures.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Parse an SPKI PEM public key.
    ///
    /// Keys below the 2048-bit floor are rejected with `InvalidParameter`.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map(Self)
            .map_err(|e| CryptoError::MalformedKeyMaterial(format!("public key: {}", e)))?;
        check_modulus(key.bits())?;
        Ok(key)
    }

    /// Serialize as SPKI PEM.
    pub fn to_pem(&self) -> CryptoResult<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::MalformedKeyMaterial(format!("public key: {}", e)))
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Short hex fingerprint (SHA-256 over the DER encoding).
    pub fn fingerprint(&self) -> String {
        let der = self
            .0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .unwrap_or_default();
        hex::encode(&Sha256::digest(&der)[..8])
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

/// RSA private key with automatic zeroization.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    /// Parse a PKCS#8 PEM private key.
    ///
    /// Keys below the 2048-bit floor are rejected with `InvalidParameter`.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map(Self)
            .map_err(|e| CryptoError::MalformedKeyMaterial(format!("private key: {}", e)))?;
        check_modulus(key.bits())?;
        Ok(key)
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Serialize as PKCS#8 PEM into a zeroizing buffer.
    pub fn to_pem(&self) -> CryptoResult<Zeroizing<String>> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::MalformedKeyMaterial(format!("private key: {}", e)))
    }

    /// Derive the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.0
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn check_modulus(bits: usize) -> CryptoResult<()> {
    if bits < MIN_RSA_BITS {
        return Err(CryptoError::InvalidParameter(format!(
            "RSA key must be at least {} bits, got {}",
            MIN_RSA_BITS, bits
        )));
    }
    Ok(())
}

/// RSA keypair created once per account.
pub struct Keypair {
    /// The public key (can be shared).
    pub public: PublicKey,
    /// The private key (must be kept secret).
    pub private: PrivateKey,
}

impl Keypair {
    /// Generate a new random keypair of `policy.rsa_bits`.
    ///
    /// CPU-bound; async callers should run it on a blocking thread.
    pub fn generate(policy: &CryptoPolicy) -> CryptoResult<Self> {
        policy.validate()?;
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), policy.rsa_bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_private(PrivateKey(private)))
    }

    /// Create a keypair from an existing private key.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { public, private }
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Key material persisted with an account.
///
/// The public key, wrapped private key, nonce and salt are produced together
/// by [`protect`] and are only meaningful as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKeyRecord {
    /// SPKI PEM public key.
    #[serde(rename = "public_key")]
    pub public_key_pem: String,
    /// PKCS#8 PEM private key encrypted under the password KEK.
    #[serde(rename = "private_key", with = "base64_bytes")]
    pub wrapped_private_key: Vec<u8>,
    #[serde(rename = "key_iv", with = "base64_bytes")]
    pub nonce: [u8; NONCE_LEN],
    #[serde(rename = "key_salt", with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// Iterations the KEK was derived with.
    pub kdf_iterations: u32,
}

impl AccountKeyRecord {
    /// Parse the stored public key.
    pub fn public_key(&self) -> CryptoResult<PublicKey> {
        PublicKey::from_pem(&self.public_key_pem)
    }

    /// Whether this record was protected under weaker parameters than `policy`.
    pub fn needs_rewrap(&self, policy: &CryptoPolicy) -> bool {
        self.kdf_iterations < policy.kdf_iterations || self.salt.len() < policy.salt_len
    }

    /// Write the record as JSON.
    pub fn save(&self, path: &Path) -> CryptoResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a record written by [`AccountKeyRecord::save`].
    pub fn load(path: &Path) -> CryptoResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Wrap a keypair's private key under a KEK derived from `password`.
///
/// `policy.rsa_bits` only sizes new keys in [`Keypair::generate`]; an existing
/// key is accepted here at any size from the 2048-bit floor up, so
/// [`rewrap`] can move a record to a stronger policy without rotating it.
pub fn protect(
    keypair: &Keypair,
    password: &str,
    policy: &CryptoPolicy,
) -> CryptoResult<AccountKeyRecord> {
    policy.validate()?;
    check_modulus(keypair.public.bits())?;

    let salt = generate_salt(policy.salt_len);
    let kek = derive_kek_with(password.as_bytes(), &salt, policy)?;

    let private_pem = keypair.private.to_pem()?;
    let wrapped = wrap_key(private_pem.as_bytes(), kek.as_bytes())?;

    Ok(AccountKeyRecord {
        public_key_pem: keypair.public.to_pem()?,
        wrapped_private_key: wrapped.ciphertext,
        nonce: wrapped.nonce,
        salt,
        kdf_iterations: policy.kdf_iterations,
    })
}

/// Recover the private key from a record.
///
/// The KEK is re-derived with the salt and iteration count stored in the
/// record, so records stay unlockable after the policy changes.
///
/// # Errors
///
/// - `AuthenticationFailure` for a wrong password or a corrupted record,
///   including stored KDF parameters below the minimums. The two cases are
///   indistinguishable.
/// - `MalformedKeyMaterial` if the authenticated bytes are not a key matching
///   the stored public key.
pub fn unlock(record: &AccountKeyRecord, password: &str) -> CryptoResult<PrivateKey> {
    let kek = derive_kek(
        password.as_bytes(),
        &record.salt,
        record.kdf_iterations,
        KEK_LEN,
    )
    .map_err(|_| CryptoError::AuthenticationFailure)?;

    let pem_bytes = unwrap_key(&record.wrapped_private_key, &record.nonce, kek.as_bytes())?;

    let private = std::str::from_utf8(&pem_bytes)
        .map_err(|_| CryptoError::MalformedKeyMaterial("private key is not UTF-8 PEM".into()))
        .and_then(PrivateKey::from_pem)
        .and_then(|private| {
            let expected = record.public_key()?;
            if private.public_key() != expected {
                return Err(CryptoError::MalformedKeyMaterial(
                    "private key does not match stored public key".into(),
                ));
            }
            Ok(private)
        });

    if let Err(CryptoError::MalformedKeyMaterial(reason)) = &private {
        tracing::error!(
            subsystem = "crypto",
            op = "unlock",
            error = %reason,
            "Authenticated key material failed to parse - stored record is corrupt"
        );
    }

    private
}

/// Re-protect the same private key under `policy`.
///
/// Used when [`AccountKeyRecord::needs_rewrap`] reports an outdated record.
/// The keypair is unchanged; only the salt, nonce and iteration count move.
pub fn rewrap(
    record: &AccountKeyRecord,
    password: &str,
    policy: &CryptoPolicy,
) -> CryptoResult<AccountKeyRecord> {
    let private = unlock(record, password)?;
    let keypair = Keypair::from_private(private);
    let upgraded = protect(&keypair, password, policy)?;
    tracing::debug!(
        subsystem = "crypto",
        op = "rewrap",
        from_iterations = record.kdf_iterations,
        to_iterations = upgraded.kdf_iterations,
        "Account key record re-wrapped"
    );
    Ok(upgraded)
}
