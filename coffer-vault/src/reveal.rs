//! Reveal: the one path that turns a stored blob back into plaintext.
//!
//! ```text
//! Unauthenticated --verify_identity--> IdentityVerified
//!                 --check_ownership--> OwnershipChecked
//!                 --decrypt----------> Decrypted
//! ```
//!
//! Each state is its own type and each transition consumes it, so a later
//! stage cannot run without every earlier one having succeeded. Any failure
//! yields [`Denied`] and nothing after it runs.

use crate::audit::{AuditAction, AuditEvent, RevealStage};
use crate::error::VaultError;
use crate::types::*;
use crate::vault::{verify_blocking, Vault};

use zeroize::Zeroizing;

/// Terminal failure state: where the attempt stopped and why.
#[derive(Debug)]
pub struct Denied {
    pub stage: RevealStage,
    pub error: VaultError,
}

impl Denied {
    fn at(stage: RevealStage, error: VaultError) -> Self {
        Self { stage, error }
    }
}

/// A reveal request nobody has vouched for yet.
pub struct Unauthenticated<'v> {
    vault: &'v Vault,
    account_id: AccountId,
    record_id: RecordId,
}

/// The caller proved they hold the account's current password.
pub struct IdentityVerified<'v> {
    vault: &'v Vault,
    account: Account,
    record_id: RecordId,
}

/// The record exists and belongs to the verified account.
pub struct OwnershipChecked<'v> {
    vault: &'v Vault,
    entry: PasswordEntry,
}

/// Plaintext of one record. Wiped on drop unless taken out.
pub struct Decrypted {
    pub record_id: RecordId,
    secret: Zeroizing<String>,
}

impl<'v> Unauthenticated<'v> {
    pub fn new(vault: &'v Vault, account_id: AccountId, record_id: RecordId) -> Self {
        Self {
            vault,
            account_id,
            record_id,
        }
    }

    /// Re-check the account's current password.
    pub async fn verify_identity(self, password: &str) -> Result<IdentityVerified<'v>, Denied> {
        let deny = |e| Denied::at(RevealStage::Unauthenticated, e);

        let account = self.vault.require_account(self.account_id).map_err(deny)?;
        let ok = verify_blocking(password, &account.password_hash)
            .await
            .map_err(deny)?;
        if !ok {
            return Err(deny(VaultError::Unauthorized));
        }
        Ok(IdentityVerified {
            vault: self.vault,
            account,
            record_id: self.record_id,
        })
    }
}

impl<'v> IdentityVerified<'v> {
    /// Look the record up by ID and owner in one predicate.
    pub fn check_ownership(self) -> Result<OwnershipChecked<'v>, Denied> {
        let deny = |e| Denied::at(RevealStage::IdentityVerified, e);

        let entry = self
            .vault
            .storage
            .find_entry(self.record_id, self.account.id)
            .map_err(deny)?
            .ok_or_else(|| deny(VaultError::NotFound))?;
        Ok(OwnershipChecked {
            vault: self.vault,
            entry,
        })
    }
}

impl<'v> OwnershipChecked<'v> {
    pub fn decrypt(self) -> Result<Decrypted, Denied> {
        let secret = self
            .vault
            .cipher
            .open(&self.entry.password)
            .map_err(|e| Denied::at(RevealStage::OwnershipChecked, e.into()))?;
        Ok(Decrypted {
            record_id: self.entry.id,
            secret: Zeroizing::new(secret),
        })
    }
}

impl Decrypted {
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn into_secret(self) -> String {
        self.secret.to_string()
    }
}

async fn run(
    vault: &Vault,
    owner: AccountId,
    id: RecordId,
    current_password: &str,
) -> Result<Decrypted, Denied> {
    Unauthenticated::new(vault, owner, id)
        .verify_identity(current_password)
        .await?
        .check_ownership()?
        .decrypt()
}

impl Vault {
    /// Decrypt one of `owner`'s entries after re-checking their password.
    ///
    /// A record owned by someone else answers `NotFound`, the same as a
    /// record that does not exist.
    pub async fn reveal_secret(
        &self,
        owner: AccountId,
        id: RecordId,
        current_password: &str,
    ) -> Result<String, VaultError> {
        match run(self, owner, id, current_password).await {
            Ok(decrypted) => {
                self.audit.record(AuditEvent::record_event(
                    owner,
                    decrypted.record_id,
                    AuditAction::SecretRevealed,
                ));
                tracing::info!(account_id = %owner, record_id = %id, "secret revealed");
                Ok(decrypted.into_secret())
            }
            Err(Denied { stage, error }) => {
                self.audit.record(
                    AuditEvent::record_event(owner, id, AuditAction::RevealDenied { stage })
                        .with_failure()
                        .with_detail(error.to_string()),
                );
                if error.is_server_fault() {
                    tracing::error!(account_id = %owner, record_id = %id, ?stage, error = %error, "reveal failed");
                } else {
                    tracing::warn!(account_id = %owner, record_id = %id, ?stage, "reveal denied");
                }
                Err(error)
            }
        }
    }
}
