//! Account and messaging workflows over a store.
//!
//! Every KDF, RSA and Argon2 call runs on tokio's blocking pool; a single
//! unlock at the default policy takes hundreds of milliseconds.

use std::sync::Arc;
use std::time::Instant;

use ciphercore_crypto::{
    hash_password, open, protect, rewrap, seal, unlock, verify_password, CryptoError,
    CryptoPolicy, Keypair,
};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::{AccountStore, MessageStore};

/// Longest accepted username, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Messaging service bound to a store and a crypto policy.
pub struct Messenger<S> {
    store: Arc<S>,
    policy: CryptoPolicy,
}

impl<S> Clone for Messenger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
        }
    }
}

impl<S> Messenger<S>
where
    S: AccountStore + MessageStore + 'static,
{
    /// Create a service, rejecting a policy below the minimums.
    pub fn new(store: Arc<S>, policy: CryptoPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { store, policy })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn policy(&self) -> &CryptoPolicy {
        &self.policy
    }

    /// Create an account with a fresh keypair protected by `password`.
    pub async fn register(&self, username: &str, password: &str) -> Result<AccountRecord> {
        let username = validate_username(username)?;
        if password.is_empty() {
            return Err(Error::InvalidInput("password must not be empty".into()));
        }
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(Error::UsernameTaken(username));
        }

        let start = Instant::now();
        let policy = self.policy.clone();
        let password = secret(password);
        let (password_hash, keys) = tokio::task::spawn_blocking(move || {
            let keypair = Keypair::generate(&policy)?;
            let keys = protect(&keypair, &password, &policy)?;
            let password_hash = hash_password(&password)?;
            Ok::<_, CryptoError>((password_hash, keys))
        })
        .await??;

        let account = self
            .store
            .insert_account(NewAccount {
                username,
                password_hash,
                keys,
            })
            .await?;

        info!(
            subsystem = "service",
            op = "register",
            account_id = account.id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Account registered"
        );
        Ok(account)
    }

    /// Check credentials and return the account.
    ///
    /// A key record protected under weaker parameters than the current policy
    /// is re-wrapped while the password is at hand. A failed upgrade is
    /// logged and does not fail the login.
    pub async fn login(&self, username: &str, password: &str) -> Result<AccountRecord> {
        let Some(mut account) = self.store.find_by_username(username.trim()).await? else {
            warn!(subsystem = "service", op = "login", "Unknown username");
            return Err(Error::InvalidCredentials);
        };

        let stored_hash = account.password_hash.clone();
        let candidate = secret(password);
        let valid =
            tokio::task::spawn_blocking(move || verify_password(&candidate, &stored_hash))
                .await??;
        if !valid {
            warn!(
                subsystem = "service",
                op = "login",
                account_id = account.id,
                "Rejected password"
            );
            return Err(Error::InvalidCredentials);
        }

        if account.keys.needs_rewrap(&self.policy) {
            let keys = account.keys.clone();
            let policy = self.policy.clone();
            let password = secret(password);
            let upgraded =
                tokio::task::spawn_blocking(move || rewrap(&keys, &password, &policy)).await?;
            match upgraded {
                Ok(keys) => {
                    self.store.update_keys(account.id, keys.clone()).await?;
                    debug!(
                        subsystem = "service",
                        op = "login",
                        account_id = account.id,
                        kdf_iterations = keys.kdf_iterations,
                        "Key record upgraded to current policy"
                    );
                    account.keys = keys;
                }
                Err(e) => warn!(
                    subsystem = "service",
                    op = "login",
                    account_id = account.id,
                    error = %e,
                    "Key record upgrade failed, keeping existing record"
                ),
            }
        }

        info!(
            subsystem = "service",
            op = "login",
            account_id = account.id,
            "Login succeeded"
        );
        Ok(account)
    }

    /// Seal `plaintext` from `sender_id` to `receiver_id` and store it.
    ///
    /// `password` unlocks the sender's private key for signing.
    pub async fn send(
        &self,
        sender_id: i64,
        password: &str,
        receiver_id: i64,
        plaintext: &[u8],
    ) -> Result<MessageRecord> {
        let sender = self.account(sender_id).await?;
        let receiver = self.account(receiver_id).await?;

        let start = Instant::now();
        let password = secret(password);
        let plaintext = plaintext.to_vec();
        let envelope = tokio::task::spawn_blocking(move || {
            let sender_key = unlock(&sender.keys, &password)?;
            let receiver_key = receiver.keys.public_key()?;
            seal(&plaintext, &sender_key, &receiver_key)
        })
        .await??;

        let message = self
            .store
            .insert_message(NewMessage {
                sender_id,
                receiver_id,
                envelope,
            })
            .await?;

        info!(
            subsystem = "service",
            op = "send",
            account_id = sender_id,
            message_id = message.id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Message sent"
        );
        Ok(message)
    }

    /// Decrypt a message for its receiver and mark it read.
    ///
    /// Only the receiver may read. A wrong receiver password surfaces as
    /// `KeyUnwrapFailure`, like any other failure to recover the message key.
    /// The message is marked read only after a successful decrypt.
    pub async fn read(
        &self,
        receiver_id: i64,
        password: &str,
        message_id: i64,
    ) -> Result<ReadMessage> {
        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or(Error::MessageNotFound(message_id))?;
        if message.receiver_id != receiver_id {
            warn!(
                subsystem = "service",
                op = "read",
                account_id = receiver_id,
                message_id,
                "Read attempted by non-receiver"
            );
            return Err(Error::Forbidden(format!(
                "message {} is not addressed to account {}",
                message_id, receiver_id
            )));
        }

        let receiver = self.account(receiver_id).await?;
        let sender = self.account(message.sender_id).await?;

        let start = Instant::now();
        let password = secret(password);
        let envelope = message.envelope.clone();
        let opened = tokio::task::spawn_blocking(move || {
            let receiver_key = unlock(&receiver.keys, &password).map_err(|e| match e {
                CryptoError::AuthenticationFailure => CryptoError::KeyUnwrapFailure,
                other => other,
            })?;
            let sender_key = sender.keys.public_key()?;
            open(&envelope, &receiver_key, &sender_key)
        })
        .await?;

        let opened = match opened {
            Ok(opened) => opened,
            Err(e) => {
                warn!(
                    subsystem = "service",
                    op = "read",
                    account_id = receiver_id,
                    message_id,
                    error = %e,
                    "Message could not be decrypted"
                );
                return Err(e.into());
            }
        };

        self.store.mark_read(message_id).await?;

        info!(
            subsystem = "service",
            op = "read",
            account_id = receiver_id,
            message_id,
            hash_valid = opened.hash_valid,
            signature_valid = opened.signature_valid,
            duration_ms = start.elapsed().as_millis() as u64,
            "Message read"
        );

        Ok(ReadMessage {
            message_id,
            sender_id: message.sender_id,
            plaintext: opened.plaintext,
            hash_valid: opened.hash_valid,
            signature_valid: opened.signature_valid,
            created_at: message.created_at,
        })
    }

    /// Inbox listing for `receiver_id`, newest first, without decrypting.
    pub async fn inbox(&self, receiver_id: i64) -> Result<Vec<InboxEntry>> {
        self.account(receiver_id).await?;
        let messages = self.store.list_inbox(receiver_id).await?;

        let mut entries = Vec::with_capacity(messages.len());
        for message in messages {
            let sender_username = self
                .store
                .get_account(message.sender_id)
                .await?
                .map(|a| a.username);
            entries.push(InboxEntry {
                message_id: message.id,
                sender_id: message.sender_id,
                sender_username,
                created_at: message.created_at,
                is_read: message.is_read,
            });
        }
        Ok(entries)
    }

    pub async fn unread_count(&self, receiver_id: i64) -> Result<usize> {
        self.account(receiver_id).await?;
        Ok(self
            .store
            .list_inbox(receiver_id)
            .await?
            .iter()
            .filter(|m| !m.is_read)
            .count())
    }

    async fn account(&self, id: i64) -> Result<AccountRecord> {
        self.store
            .get_account(id)
            .await?
            .ok_or(Error::AccountNotFound(id))
    }
}

/// Copy of a password for a blocking task, wiped when the task drops it.
fn secret(password: &str) -> Zeroizing<String> {
    Zeroizing::new(password.to_string())
}

fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::InvalidInput("username must not be empty".into()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(Error::InvalidInput(format!(
            "username longer than {} bytes",
            MAX_USERNAME_LEN
        )));
    }
    if username.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(Error::InvalidInput(
            "username must not contain whitespace or control characters".into(),
        ));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice ").unwrap(), "alice");
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN + 1)).is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_LEN)).is_ok());
    }

    #[test]
    fn test_secret_holds_password() {
        let copy = secret("Secret123!");
        assert_eq!(copy.as_str(), "Secret123!");
    }

    #[test]
    fn test_new_rejects_weak_policy() {
        let mut policy = CryptoPolicy::minimum();
        policy.kdf_iterations = 1_000;
        let result = Messenger::new(Arc::new(MemoryStore::new()), policy);
        assert!(matches!(
            result,
            Err(Error::Crypto(CryptoError::InvalidParameter(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_password() {
        let messenger =
            Messenger::new(Arc::new(MemoryStore::new()), CryptoPolicy::minimum()).unwrap();
        let err = messenger.register("alice", "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(messenger.store().account_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_accounts() {
        let messenger =
            Messenger::new(Arc::new(MemoryStore::new()), CryptoPolicy::minimum()).unwrap();
        assert!(matches!(
            messenger.inbox(5).await,
            Err(Error::AccountNotFound(5))
        ));
        assert!(matches!(
            messenger.read(1, "pw", 9).await,
            Err(Error::MessageNotFound(9))
        ));
        assert!(matches!(
            messenger.login("nobody", "pw").await,
            Err(Error::InvalidCredentials)
        ));
    }
}
