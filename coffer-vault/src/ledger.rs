//! Income/expense ledger.

use crate::audit::{AuditAction, AuditEvent};
use crate::error::VaultError;
use crate::types::*;
use crate::vault::Vault;

impl Vault {
    pub async fn create_transaction(
        &self,
        owner: AccountId,
        mut tx: NewTransaction,
    ) -> Result<Transaction, VaultError> {
        tx.title = tx.title.trim().to_string();
        if tx.title.is_empty() {
            return Err(VaultError::validation("title is required"));
        }
        if !tx.amount.is_finite() || tx.amount <= 0.0 {
            return Err(VaultError::validation("amount must be a positive number"));
        }
        tx.category = tx.category.trim().to_string();
        self.require_account(owner)?;

        let stored = self.storage.insert_transaction(owner, tx)?;
        self.audit.record(AuditEvent::record_event(
            owner,
            stored.id,
            AuditAction::TransactionCreated,
        ));
        Ok(stored)
    }

    /// Newest date first. `period` narrows to one calendar month.
    pub async fn list_transactions(
        &self,
        owner: AccountId,
        period: Option<Period>,
    ) -> Result<Vec<Transaction>, VaultError> {
        self.storage.list_transactions(owner, period)
    }

    pub async fn delete_transaction(&self, owner: AccountId, id: RecordId) -> Result<(), VaultError> {
        self.storage.delete_transaction(id, owner)?;
        self.audit.record(AuditEvent::record_event(
            owner,
            id,
            AuditAction::TransactionDeleted,
        ));
        Ok(())
    }
}
