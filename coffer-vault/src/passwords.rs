//! Password manager: sealed third-party credentials.
//!
//! Plaintext enters through `store_secret` / `update_secret` and is sealed
//! before storage sees it. Nothing here ever opens a blob; outward views
//! carry the redaction marker.

use crate::audit::{AuditAction, AuditEvent};
use crate::error::VaultError;
use crate::types::*;
use crate::vault::Vault;

fn require_account_name(fields: &SecretFields) -> Result<String, VaultError> {
    let name = fields.account_name.trim();
    if name.is_empty() {
        return Err(VaultError::validation("account_name is required"));
    }
    Ok(name.to_string())
}

impl Vault {
    /// Seal and store a new entry for `owner`.
    pub async fn store_secret(
        &self,
        owner: AccountId,
        fields: SecretFields,
    ) -> Result<RedactedEntry, VaultError> {
        let account_name = require_account_name(&fields)?;
        if fields.password.is_empty() {
            return Err(VaultError::validation("password is required"));
        }
        self.require_account(owner)?;

        let blob = self.cipher.seal(&fields.password)?;
        let entry = self.storage.insert_entry(NewEntry {
            user_id: owner,
            category: fields.category.trim().to_string(),
            account_name,
            username: fields.username.trim().to_string(),
            password: blob,
            status: fields.status,
        })?;

        self.audit.record(AuditEvent::record_event(
            owner,
            entry.id,
            AuditAction::SecretStored,
        ));
        tracing::debug!(account_id = %owner, record_id = %entry.id, "secret stored");
        Ok(RedactedEntry::from(&entry))
    }

    /// List `owner`'s entries, newest first. Blobs are never opened.
    pub async fn list_secrets(
        &self,
        owner: AccountId,
        filter: &SecretFilter,
    ) -> Result<Vec<RedactedEntry>, VaultError> {
        let entries = self.storage.list_entries(owner, filter)?;
        Ok(entries.iter().map(RedactedEntry::from).collect())
    }

    /// Replace an entry's fields.
    ///
    /// A non-empty password is sealed afresh; an empty one keeps the stored
    /// blob as is.
    pub async fn update_secret(
        &self,
        owner: AccountId,
        id: RecordId,
        fields: SecretFields,
    ) -> Result<RedactedEntry, VaultError> {
        let account_name = require_account_name(&fields)?;
        let mut entry = self
            .storage
            .find_entry(id, owner)?
            .ok_or(VaultError::NotFound)?;

        if !fields.password.is_empty() {
            entry.password = self.cipher.seal(&fields.password)?;
        }
        entry.category = fields.category.trim().to_string();
        entry.account_name = account_name;
        entry.username = fields.username.trim().to_string();
        entry.status = fields.status;

        self.storage.update_entry(&entry)?;
        self.audit.record(AuditEvent::record_event(
            owner,
            entry.id,
            AuditAction::SecretUpdated,
        ));
        Ok(RedactedEntry::from(&entry))
    }

    pub async fn delete_secret(&self, owner: AccountId, id: RecordId) -> Result<(), VaultError> {
        self.storage.delete_entry(id, owner)?;
        self.audit
            .record(AuditEvent::record_event(owner, id, AuditAction::SecretDeleted));
        Ok(())
    }
}
