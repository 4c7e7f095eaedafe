//! TOTP seed storage. Codes are derived client-side from the seed.

use crate::audit::{AuditAction, AuditEvent};
use crate::error::VaultError;
use crate::types::*;
use crate::vault::Vault;

/// Strip spaces, uppercase, drop padding; reject anything outside RFC 4648
/// base32.
fn normalize_seed(raw: &str) -> Result<String, VaultError> {
    let seed: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let seed = seed.trim_end_matches('=');
    if seed.is_empty() {
        return Err(VaultError::validation("secret_code is required"));
    }
    if !seed.chars().all(|c| matches!(c, 'A'..='Z' | '2'..='7')) {
        return Err(VaultError::validation("secret_code must be base32"));
    }
    Ok(seed.to_string())
}

impl Vault {
    pub async fn create_totp(&self, owner: AccountId, totp: NewTotp) -> Result<TotpAccount, VaultError> {
        let service_name = totp.service_name.trim().to_string();
        if service_name.is_empty() {
            return Err(VaultError::validation("service_name is required"));
        }
        let secret_code = normalize_seed(&totp.secret_code)?;
        self.require_account(owner)?;

        let stored = self.storage.insert_totp(
            owner,
            NewTotp {
                service_name,
                secret_code,
            },
        )?;
        self.audit.record(AuditEvent::record_event(
            owner,
            stored.id,
            AuditAction::TotpCreated,
        ));
        Ok(stored)
    }

    /// Newest first, optionally narrowed by service name.
    pub async fn list_totp(
        &self,
        owner: AccountId,
        search: Option<&str>,
    ) -> Result<Vec<TotpAccount>, VaultError> {
        self.storage.list_totp(owner, search)
    }

    pub async fn delete_totp(&self, owner: AccountId, id: RecordId) -> Result<(), VaultError> {
        self.storage.delete_totp(id, owner)?;
        self.audit
            .record(AuditEvent::record_event(owner, id, AuditAction::TotpDeleted));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_seed;
    use crate::test_support::vault_with_audit;
    use crate::*;

    fn totp(service: &str, seed: &str) -> NewTotp {
        NewTotp {
            service_name: service.into(),
            secret_code: seed.into(),
        }
    }

    #[test]
    fn seed_normalization() {
        assert_eq!(normalize_seed("jbsw y3dp ehpk 3pxp").unwrap(), "JBSWY3DPEHPK3PXP");
        assert_eq!(normalize_seed("MZXW6===").unwrap(), "MZXW6");
        assert!(normalize_seed("   ").is_err());
        assert!(normalize_seed("JBSW1890").is_err());
    }

    #[tokio::test]
    async fn test_create_list_search() {
        let (vault, _, _) = vault_with_audit();
        let alice = vault.register("alice", "pw1").await.unwrap();
        vault.create_totp(alice.id, totp("GitHub", "jbswy3dpehpk3pxp")).await.unwrap();
        vault.create_totp(alice.id, totp("AWS Console", "MZXW6YTB")).await.unwrap();

        let all = vault.list_totp(alice.id, None).await.unwrap();
        assert_eq!(all[0].service_name, "AWS Console");
        assert_eq!(all[1].secret_code, "JBSWY3DPEHPK3PXP");

        let hits = vault.list_totp(alice.id, Some("github")).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let (vault, _, _) = vault_with_audit();
        let alice = vault.register("alice", "pw1").await.unwrap();
        let bob = vault.register("bob", "pw2").await.unwrap();
        let t = vault.create_totp(alice.id, totp("GitHub", "MZXW6YTB")).await.unwrap();

        assert!(matches!(vault.delete_totp(bob.id, t.id).await, Err(VaultError::NotFound)));
        assert!(vault.list_totp(bob.id, None).await.unwrap().is_empty());
        vault.delete_totp(alice.id, t.id).await.unwrap();
    }
}
