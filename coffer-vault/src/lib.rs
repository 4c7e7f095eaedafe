//! # Coffer Vault
//!
//! Accounts, a password manager with an authenticated reveal flow, an
//! income/expense ledger and TOTP seed storage.
//!
//! Built on `coffer-envelope`: stored passwords are sealed with AES-256-GCM
//! and account passwords are Argon2id hashes.
//!
//! ## Quick Start
//!
//! ```
//! use coffer_vault::*;
//! use coffer_envelope::{CipherKey, SecretCipher};
//! use std::sync::Arc;
//!
//! # tokio_test_runtime(async {
//! let storage = Arc::new(InMemoryBackend::new());
//! let audit = Arc::new(InMemoryAuditSink::new());
//! let cipher = Arc::new(SecretCipher::new(CipherKey::generate()));
//! let vault = Vault::new(storage, audit, cipher);
//!
//! let alice = vault.register("alice", "pw1").await.unwrap();
//! let entry = vault.store_secret(alice.id, SecretFields {
//!     category: "Email".into(),
//!     account_name: "Gmail".into(),
//!     username: "a".into(),
//!     password: "s3cr3t".into(),
//!     ..Default::default()
//! }).await.unwrap();
//! assert_eq!(entry.password, REDACTION_MARKER);
//!
//! let secret = vault.reveal_secret(alice.id, entry.id, "pw1").await.unwrap();
//! assert_eq!(secret, "s3cr3t");
//! # });
//! # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod audit;
pub mod error;
pub mod ledger;
pub mod passwords;
pub mod reveal;
pub mod storage;
pub mod totp;
pub mod types;
pub mod vault;

// Re-export main types for convenience
pub use audit::{
    AuditAction, AuditEvent, AuditSinkSync, FileAuditSink, InMemoryAuditSink, IntegrityChainSink,
    RevealStage, TracingAuditSink,
};
pub use error::VaultError;
pub use reveal::Denied;
pub use storage::{FileBackend, InMemoryBackend, StorageBackend};
pub use types::{
    Account, AccountId, AccountSummary, EntryStatus, NewTotp, NewTransaction, PasswordEntry,
    Period, RecordId, RedactedEntry, SecretFields, SecretFilter, TotpAccount, Transaction,
    TransactionKind, REDACTION_MARKER,
};
pub use vault::Vault;


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::vault_with_audit;

    // === Registration ===

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (vault, storage, audit) = vault_with_audit();
        let account = vault.register("alice", "pw1").await.unwrap();

        assert_eq!(account.id, AccountId(1));
        assert_eq!(account.username, "alice");
        assert!(account.password_hash.as_str().starts_with("$argon2id$"));
        assert!(!account.password_hash.as_str().contains("pw1"));

        let stored = storage.find_account(account.id).unwrap().unwrap();
        assert_eq!(stored.password_hash, account.password_hash);
        assert_eq!(audit.events()[0].action, AuditAction::AccountRegistered);
    }

    #[tokio::test]
    async fn test_register_duplicate_conflicts() {
        let (vault, _, _) = vault_with_audit();
        vault.register("alice", "pw1").await.unwrap();
        assert!(matches!(
            vault.register("alice", "other").await,
            Err(VaultError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (vault, _, _) = vault_with_audit();
        assert!(matches!(vault.register("  ", "pw").await, Err(VaultError::Validation(_))));
        assert!(matches!(vault.register("alice", "").await, Err(VaultError::Validation(_))));
        let long = "x".repeat(vault::MAX_USERNAME_LEN + 1);
        assert!(matches!(vault.register(&long, "pw").await, Err(VaultError::Validation(_))));
    }

    // === Login ===

    #[tokio::test]
    async fn test_login() {
        let (vault, _, audit) = vault_with_audit();
        let alice = vault.register("alice", "pw1").await.unwrap();

        let summary = vault.login("alice", "pw1").await.unwrap();
        assert_eq!(summary.account_id, alice.id);
        assert_eq!(summary.username, "alice");

        assert!(matches!(vault.login("alice", "pw2").await, Err(VaultError::Unauthorized)));
        assert!(matches!(vault.login("nobody", "pw1").await, Err(VaultError::NotFound)));

        let failures = audit
            .events()
            .into_iter()
            .filter(|e| e.action == AuditAction::LoginFailed)
            .count();
        assert_eq!(failures, 2);
    }

    #[test]
    fn unknown_user_hash_matches_live_parameters() {
        let hash = coffer_envelope::hash_password("pw1").unwrap();
        let live: Vec<&str> = hash.as_str().split('$').collect();
        let dummy: Vec<&str> = crate::vault::DUMMY_CREDENTIAL.split('$').collect();

        assert_eq!(dummy.len(), live.len());
        // algorithm, version and cost parameters
        assert_eq!(dummy[1..4], live[1..4]);
        // salt and digest widths
        assert_eq!(dummy[4].len(), live[4].len());
        assert_eq!(dummy[5].len(), live[5].len());
        let dummy = coffer_envelope::CredentialHash::from_stored(crate::vault::DUMMY_CREDENTIAL);
        assert!(!coffer_envelope::verify_password("pw1", &dummy));
    }

    // === Password change ===

    #[tokio::test]
    async fn test_change_password() {
        let (vault, _, _) = vault_with_audit();
        let alice = vault.register("alice", "pw1").await.unwrap();

        assert!(matches!(
            vault.change_password(alice.id, "wrong", "pw2").await,
            Err(VaultError::Unauthorized)
        ));
        assert!(matches!(
            vault.change_password(AccountId(42), "pw1", "pw2").await,
            Err(VaultError::NotFound)
        ));

        vault.change_password(alice.id, "pw1", "pw2").await.unwrap();
        assert!(matches!(vault.login("alice", "pw1").await, Err(VaultError::Unauthorized)));
        vault.login("alice", "pw2").await.unwrap();
    }

    #[tokio::test]
    async fn test_password_change_gates_reveal() {
        let (vault, _, _) = vault_with_audit();
        let alice = vault.register("alice", "pw1").await.unwrap();
        let entry = vault
            .store_secret(
                alice.id,
                SecretFields {
                    account_name: "Gmail".into(),
                    password: "s3cr3t".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        vault.change_password(alice.id, "pw1", "pw2").await.unwrap();
        assert!(matches!(
            vault.reveal_secret(alice.id, entry.id, "pw1").await,
            Err(VaultError::Unauthorized)
        ));
        assert_eq!(vault.reveal_secret(alice.id, entry.id, "pw2").await.unwrap(), "s3cr3t");
    }

    // === Concurrency ===

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stores_get_distinct_ids() {
        let (vault, _, _) = vault_with_audit();
        let alice = vault.register("alice", "pw1").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let vault = vault.clone();
            handles.push(tokio::spawn(async move {
                vault
                    .store_secret(
                        alice.id,
                        SecretFields {
                            account_name: format!("site-{}", i),
                            password: format!("pw-{}", i),
                            ..Default::default()
                        },
                    )
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);
    }
}
