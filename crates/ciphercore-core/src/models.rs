//! Persisted record shapes and service result types.

use chrono::{DateTime, Utc};
use ciphercore_crypto::{integrity_warning, AccountKeyRecord, MessageEnvelope};
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// `keys` flattens into the `public_key`, `private_key`, `key_salt`,
/// `key_iv` and `kdf_iterations` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string for login checks.
    pub password_hash: String,
    #[serde(flatten)]
    pub keys: AccountKeyRecord,
    pub created_at: DateTime<Utc>,
}

/// Account fields supplied on insert; the store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub keys: AccountKeyRecord,
}

/// A stored message.
///
/// `envelope` flattens into `encrypted_message`, `encrypted_aes_key`, `iv`,
/// `message_hash` and `signature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    #[serde(flatten)]
    pub envelope: MessageEnvelope,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

/// Message fields supplied on insert; the store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub envelope: MessageEnvelope,
}

/// Inbox listing row (no ciphertext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub message_id: i64,
    pub sender_id: i64,
    pub sender_username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// A decrypted message with its integrity findings.
#[derive(Clone, Serialize)]
pub struct ReadMessage {
    pub message_id: i64,
    pub sender_id: i64,
    pub plaintext: Vec<u8>,
    pub hash_valid: bool,
    pub signature_valid: bool,
    pub created_at: DateTime<Utc>,
}

impl ReadMessage {
    /// Plaintext as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.plaintext).into_owned()
    }

    /// Warning to show next to the message, if any finding failed.
    pub fn warning(&self) -> Option<&'static str> {
        integrity_warning(self.hash_valid, self.signature_valid)
    }
}

impl std::fmt::Debug for ReadMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadMessage")
            .field("message_id", &self.message_id)
            .field("sender_id", &self.sender_id)
            .field("plaintext_len", &self.plaintext.len())
            .field("hash_valid", &self.hash_valid)
            .field("signature_valid", &self.signature_valid)
            .finish()
    }
}
