//! Storage traits for accounts and messages.
//!
//! The messaging service only talks to these traits, so a database backend
//! and the in-memory store are interchangeable.

use async_trait::async_trait;
use ciphercore_crypto::AccountKeyRecord;

use crate::error::Result;
use crate::models::*;

/// Repository for account records.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Fails with `UsernameTaken` on a duplicate name.
    async fn insert_account(&self, account: NewAccount) -> Result<AccountRecord>;

    /// Fetch an account by id.
    async fn get_account(&self, id: i64) -> Result<Option<AccountRecord>>;

    /// Fetch an account by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<AccountRecord>>;

    /// Replace an account's key record (after a rewrap).
    async fn update_keys(&self, id: i64, keys: AccountKeyRecord) -> Result<()>;
}

/// Repository for stored messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a sealed message.
    async fn insert_message(&self, message: NewMessage) -> Result<MessageRecord>;

    /// Fetch a message by id.
    async fn get_message(&self, id: i64) -> Result<Option<MessageRecord>>;

    /// Messages addressed to `receiver_id`, newest first.
    async fn list_inbox(&self, receiver_id: i64) -> Result<Vec<MessageRecord>>;

    /// Mark a message read. Fails with `MessageNotFound` if it does not exist.
    async fn mark_read(&self, id: i64) -> Result<()>;
}
