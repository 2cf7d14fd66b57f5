//! In-memory implementation of the storage traits.
//!
//! Used by tests and the single-process CLI flows. Ids are assigned from
//! monotonically increasing counters starting at 1.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use ciphercore_crypto::AccountKeyRecord;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::{AccountStore, MessageStore};

#[derive(Default)]
struct Tables {
    accounts: HashMap<i64, AccountRecord>,
    messages: HashMap<i64, MessageRecord>,
    next_account_id: i64,
    next_message_id: i64,
}

/// Account and message tables behind a single async lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    /// Number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.tables.read().await.messages.len()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, account: NewAccount) -> Result<AccountRecord> {
        let mut tables = self.tables.write().await;

        if tables
            .accounts
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Err(Error::UsernameTaken(account.username));
        }

        tables.next_account_id += 1;
        let record = AccountRecord {
            id: tables.next_account_id,
            username: account.username,
            password_hash: account.password_hash,
            keys: account.keys,
            created_at: Utc::now(),
        };
        tables.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_account(&self, id: i64) -> Result<Option<AccountRecord>> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AccountRecord>> {
        Ok(self
            .tables
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn update_keys(&self, id: i64, keys: AccountKeyRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or(Error::AccountNotFound(id))?;
        account.keys = keys;
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: NewMessage) -> Result<MessageRecord> {
        let mut tables = self.tables.write().await;
        tables.next_message_id += 1;
        let record = MessageRecord {
            id: tables.next_message_id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            envelope: message.envelope,
            created_at: Utc::now(),
            is_read: false,
        };
        tables.messages.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_message(&self, id: i64) -> Result<Option<MessageRecord>> {
        Ok(self.tables.read().await.messages.get(&id).cloned())
    }

    async fn list_inbox(&self, receiver_id: i64) -> Result<Vec<MessageRecord>> {
        let tables = self.tables.read().await;
        let mut inbox: Vec<MessageRecord> = tables
            .messages
            .values()
            .filter(|m| m.receiver_id == receiver_id)
            .cloned()
            .collect();
        inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(inbox)
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        let message = tables
            .messages
            .get_mut(&id)
            .ok_or(Error::MessageNotFound(id))?;
        message.is_read = true;
        Ok(())
    }
}
