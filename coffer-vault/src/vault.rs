//! The vault service: accounts and credential checks, plus the shared
//! handles every other operation runs on.
//!
//! Password-manager, reveal, ledger and TOTP operations live in their own
//! modules as further `impl Vault` blocks.

use crate::audit::{AuditAction, AuditEvent, AuditSinkSync};
use crate::error::VaultError;
use crate::storage::StorageBackend;
use crate::types::*;

use coffer_envelope::{hash_password, verify_password, CredentialHash, SecretCipher};
use std::sync::Arc;
use zeroize::Zeroizing;

pub const MAX_USERNAME_LEN: usize = 64;

/// Well-formed hash with the live Argon2 parameters. Verified against on an
/// unknown username so a miss costs the same as a wrong password.
pub(crate) const DUMMY_CREDENTIAL: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Cheap to clone; every clone shares the same storage, audit sink and key.
#[derive(Clone)]
pub struct Vault {
    pub(crate) storage: Arc<dyn StorageBackend>,
    pub(crate) audit: Arc<dyn AuditSinkSync>,
    pub(crate) cipher: Arc<SecretCipher>,
}

impl Vault {
    /// Create a vault over the given storage backend, audit sink and cipher.
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        audit: Arc<dyn AuditSinkSync>,
        cipher: Arc<SecretCipher>,
    ) -> Self {
        Self {
            storage,
            audit,
            cipher,
        }
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Create an account. Usernames are unique.
    pub async fn register(&self, username: &str, password: &str) -> Result<Account, VaultError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(VaultError::validation("username is required"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(VaultError::validation(format!(
                "username longer than {} characters",
                MAX_USERNAME_LEN
            )));
        }
        if password.is_empty() {
            return Err(VaultError::validation("password is required"));
        }

        // Skip the expensive hash when the name is obviously taken; the
        // insert still enforces uniqueness.
        if self.storage.find_account_by_username(username)?.is_some() {
            return Err(VaultError::Conflict(format!("username '{}'", username)));
        }

        let hash = hash_blocking(password).await?;
        let account = self.storage.insert_account(username, &hash)?;

        self.audit.record(AuditEvent::account_event(
            account.id,
            AuditAction::AccountRegistered,
        ));
        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Check a username/password pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<AccountSummary, VaultError> {
        let account = match self.storage.find_account_by_username(username.trim())? {
            Some(a) => a,
            None => {
                verify_blocking(password, &CredentialHash::from_stored(DUMMY_CREDENTIAL)).await?;
                self.audit.record(
                    AuditEvent::new(AuditAction::LoginFailed)
                        .with_failure()
                        .with_detail("unknown username"),
                );
                return Err(VaultError::NotFound);
            }
        };

        if !verify_blocking(password, &account.password_hash).await? {
            self.audit.record(
                AuditEvent::account_event(account.id, AuditAction::LoginFailed).with_failure(),
            );
            tracing::warn!(account_id = %account.id, "login rejected");
            return Err(VaultError::Unauthorized);
        }

        self.audit
            .record(AuditEvent::account_event(account.id, AuditAction::LoginSucceeded));
        Ok(AccountSummary::from(&account))
    }

    /// Replace an account's password hash after checking the old password.
    pub async fn change_password(
        &self,
        account_id: AccountId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), VaultError> {
        if new_password.is_empty() {
            return Err(VaultError::validation("new password is required"));
        }
        let account = self.require_account(account_id)?;

        if !verify_blocking(old_password, &account.password_hash).await? {
            self.audit.record(
                AuditEvent::account_event(account.id, AuditAction::PasswordChangeRejected)
                    .with_failure(),
            );
            tracing::warn!(account_id = %account.id, "password change rejected");
            return Err(VaultError::Unauthorized);
        }

        let hash = hash_blocking(new_password).await?;
        self.storage.update_password_hash(account.id, &hash)?;

        self.audit
            .record(AuditEvent::account_event(account.id, AuditAction::PasswordChanged));
        tracing::info!(account_id = %account.id, "password changed");
        Ok(())
    }

    /// Load an account that must exist.
    pub(crate) fn require_account(&self, account_id: AccountId) -> Result<Account, VaultError> {
        if account_id.0 == 0 {
            return Err(VaultError::validation("user_id is required"));
        }
        self.storage
            .find_account(account_id)?
            .ok_or(VaultError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Argon2 off the async executor
// ---------------------------------------------------------------------------

pub(crate) async fn hash_blocking(password: &str) -> Result<CredentialHash, VaultError> {
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| VaultError::Internal(format!("hash task: {}", e)))?
        .map_err(VaultError::from)
}

pub(crate) async fn verify_blocking(password: &str, hash: &CredentialHash) -> Result<bool, VaultError> {
    let password = Zeroizing::new(password.to_owned());
    let hash = hash.clone();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| VaultError::Internal(format!("verify task: {}", e)))
}
