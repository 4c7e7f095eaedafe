//! Storage backends: where accounts, sealed secrets, ledger rows and TOTP
//! seeds live.
//!
//! Every owned row is looked up, updated and deleted through a predicate
//! that includes the owner's ID. A row that exists under another owner is
//! indistinguishable from a row that does not exist.

use crate::error::VaultError;
use crate::types::*;

use chrono::Utc;
use coffer_envelope::CredentialHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Backend for persisting vault data.
///
/// Implement this for your infrastructure:
/// - InMemoryBackend (testing)
/// - FileBackend (single-user deployments)
/// - Your database (production)
pub trait StorageBackend: Send + Sync {
    // Accounts
    fn insert_account(&self, username: &str, hash: &CredentialHash) -> Result<Account, VaultError>;
    fn find_account(&self, id: AccountId) -> Result<Option<Account>, VaultError>;
    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, VaultError>;
    fn update_password_hash(&self, id: AccountId, hash: &CredentialHash) -> Result<(), VaultError>;

    // Password manager
    fn insert_entry(&self, entry: NewEntry) -> Result<PasswordEntry, VaultError>;
    fn find_entry(&self, id: RecordId, owner: AccountId) -> Result<Option<PasswordEntry>, VaultError>;
    fn list_entries(&self, owner: AccountId, filter: &SecretFilter) -> Result<Vec<PasswordEntry>, VaultError>;
    fn update_entry(&self, entry: &PasswordEntry) -> Result<(), VaultError>;
    fn delete_entry(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError>;

    // Ledger
    fn insert_transaction(&self, owner: AccountId, tx: NewTransaction) -> Result<Transaction, VaultError>;
    fn list_transactions(&self, owner: AccountId, period: Option<Period>) -> Result<Vec<Transaction>, VaultError>;
    fn delete_transaction(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError>;

    // TOTP
    fn insert_totp(&self, owner: AccountId, totp: NewTotp) -> Result<TotpAccount, VaultError>;
    fn list_totp(&self, owner: AccountId, search: Option<&str>) -> Result<Vec<TotpAccount>, VaultError>;
    fn delete_totp(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError>;
}

// ---------------------------------------------------------------------------
// Tables (shared by both backends)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Tables {
    accounts: BTreeMap<u64, Account>,
    entries: BTreeMap<u64, PasswordEntry>,
    transactions: BTreeMap<u64, Transaction>,
    totp: BTreeMap<u64, TotpAccount>,
    next_account: u64,
    next_entry: u64,
    next_transaction: u64,
    next_totp: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl Tables {
    fn insert_account(&mut self, username: &str, hash: &CredentialHash) -> Result<Account, VaultError> {
        if self.accounts.values().any(|a| a.username == username) {
            return Err(VaultError::Conflict(format!("username '{}'", username)));
        }
        let id = next_id(&mut self.next_account);
        let account = Account {
            id: AccountId(id),
            username: username.to_string(),
            password_hash: hash.clone(),
            created_at: Utc::now(),
        };
        self.accounts.insert(id, account.clone());
        Ok(account)
    }

    fn find_account(&self, id: AccountId) -> Option<Account> {
        self.accounts.get(&id.0).cloned()
    }

    fn find_account_by_username(&self, username: &str) -> Option<Account> {
        self.accounts.values().find(|a| a.username == username).cloned()
    }

    fn update_password_hash(&mut self, id: AccountId, hash: &CredentialHash) -> Result<(), VaultError> {
        let account = self.accounts.get_mut(&id.0).ok_or(VaultError::NotFound)?;
        account.password_hash = hash.clone();
        Ok(())
    }

    fn insert_entry(&mut self, entry: NewEntry) -> PasswordEntry {
        let id = next_id(&mut self.next_entry);
        let stored = PasswordEntry {
            id: RecordId(id),
            user_id: entry.user_id,
            category: entry.category,
            account_name: entry.account_name,
            username: entry.username,
            password: entry.password,
            status: entry.status,
        };
        self.entries.insert(id, stored.clone());
        stored
    }

    fn find_entry(&self, id: RecordId, owner: AccountId) -> Option<PasswordEntry> {
        self.entries
            .get(&id.0)
            .filter(|e| e.user_id == owner)
            .cloned()
    }

    fn list_entries(&self, owner: AccountId, filter: &SecretFilter) -> Vec<PasswordEntry> {
        let category = filter.category();
        let search = filter.search().map(str::to_lowercase);
        self.entries
            .values()
            .rev()
            .filter(|e| e.user_id == owner)
            .filter(|e| category.map_or(true, |c| e.category == c))
            .filter(|e| {
                search.as_deref().map_or(true, |s| {
                    contains_ci(&e.account_name, s) || contains_ci(&e.username, s)
                })
            })
            .cloned()
            .collect()
    }

    fn update_entry(&mut self, entry: &PasswordEntry) -> Result<(), VaultError> {
        match self.entries.get_mut(&entry.id.0) {
            Some(existing) if existing.user_id == entry.user_id => {
                *existing = entry.clone();
                Ok(())
            }
            _ => Err(VaultError::NotFound),
        }
    }

    fn delete_entry(&mut self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        match self.entries.get(&id.0) {
            Some(e) if e.user_id == owner => {
                self.entries.remove(&id.0);
                Ok(())
            }
            _ => Err(VaultError::NotFound),
        }
    }

    fn insert_transaction(&mut self, owner: AccountId, tx: NewTransaction) -> Transaction {
        let id = next_id(&mut self.next_transaction);
        let stored = Transaction {
            id: RecordId(id),
            user_id: owner,
            title: tx.title,
            amount: tx.amount,
            kind: tx.kind,
            category: tx.category,
            date: tx.date,
            created_at: Utc::now(),
        };
        self.transactions.insert(id, stored.clone());
        stored
    }

    fn list_transactions(&self, owner: AccountId, period: Option<Period>) -> Vec<Transaction> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|t| t.user_id == owner)
            .filter(|t| period.map_or(true, |p| p.contains(t.date)))
            .cloned()
            .collect();
        // Newest date first; ties broken by newest row.
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows
    }

    fn delete_transaction(&mut self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        match self.transactions.get(&id.0) {
            Some(t) if t.user_id == owner => {
                self.transactions.remove(&id.0);
                Ok(())
            }
            _ => Err(VaultError::NotFound),
        }
    }

    fn insert_totp(&mut self, owner: AccountId, totp: NewTotp) -> TotpAccount {
        let id = next_id(&mut self.next_totp);
        let stored = TotpAccount {
            id: RecordId(id),
            user_id: owner,
            service_name: totp.service_name,
            secret_code: totp.secret_code,
        };
        self.totp.insert(id, stored.clone());
        stored
    }

    fn list_totp(&self, owner: AccountId, search: Option<&str>) -> Vec<TotpAccount> {
        let search = search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
        self.totp
            .values()
            .rev()
            .filter(|t| t.user_id == owner)
            .filter(|t| search.as_deref().map_or(true, |s| contains_ci(&t.service_name, s)))
            .cloned()
            .collect()
    }

    fn delete_totp(&mut self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        match self.totp.get(&id.0) {
            Some(t) if t.user_id == owner => {
                self.totp.remove(&id.0);
                Ok(())
            }
            _ => Err(VaultError::NotFound),
        }
    }
}

fn poisoned() -> VaultError {
    VaultError::Storage("lock poisoned".into())
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// In-memory storage (for testing and ephemeral use).
pub struct InMemoryBackend {
    tables: RwLock<Tables>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, VaultError> {
        self.tables.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, VaultError> {
        self.tables.write().map_err(|_| poisoned())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn insert_account(&self, username: &str, hash: &CredentialHash) -> Result<Account, VaultError> {
        self.write()?.insert_account(username, hash)
    }

    fn find_account(&self, id: AccountId) -> Result<Option<Account>, VaultError> {
        Ok(self.read()?.find_account(id))
    }

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, VaultError> {
        Ok(self.read()?.find_account_by_username(username))
    }

    fn update_password_hash(&self, id: AccountId, hash: &CredentialHash) -> Result<(), VaultError> {
        self.write()?.update_password_hash(id, hash)
    }

    fn insert_entry(&self, entry: NewEntry) -> Result<PasswordEntry, VaultError> {
        Ok(self.write()?.insert_entry(entry))
    }

    fn find_entry(&self, id: RecordId, owner: AccountId) -> Result<Option<PasswordEntry>, VaultError> {
        Ok(self.read()?.find_entry(id, owner))
    }

    fn list_entries(&self, owner: AccountId, filter: &SecretFilter) -> Result<Vec<PasswordEntry>, VaultError> {
        Ok(self.read()?.list_entries(owner, filter))
    }

    fn update_entry(&self, entry: &PasswordEntry) -> Result<(), VaultError> {
        self.write()?.update_entry(entry)
    }

    fn delete_entry(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        self.write()?.delete_entry(id, owner)
    }

    fn insert_transaction(&self, owner: AccountId, tx: NewTransaction) -> Result<Transaction, VaultError> {
        Ok(self.write()?.insert_transaction(owner, tx))
    }

    fn list_transactions(&self, owner: AccountId, period: Option<Period>) -> Result<Vec<Transaction>, VaultError> {
        Ok(self.read()?.list_transactions(owner, period))
    }

    fn delete_transaction(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        self.write()?.delete_transaction(id, owner)
    }

    fn insert_totp(&self, owner: AccountId, totp: NewTotp) -> Result<TotpAccount, VaultError> {
        Ok(self.write()?.insert_totp(owner, totp))
    }

    fn list_totp(&self, owner: AccountId, search: Option<&str>) -> Result<Vec<TotpAccount>, VaultError> {
        Ok(self.read()?.list_totp(owner, search))
    }

    fn delete_totp(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        self.write()?.delete_totp(id, owner)
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// File-based storage (one JSON snapshot, rewritten on every change).
///
/// Directory layout:
/// ```text
/// data/
///   vault.json
/// ```
///
/// A change is applied to a copy, written to `vault.json.tmp`, renamed into
/// place, and only then made visible to readers. A failed write leaves both
/// the file and the in-memory state untouched.
pub struct FileBackend {
    path: PathBuf,
    tables: RwLock<Tables>,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| VaultError::Storage(format!("create dir: {}", e)))?;
        let path = dir.join("vault.json");

        let tables = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .map_err(|e| VaultError::Storage(format!("read: {}", e)))?;
            serde_json::from_str(&data)
                .map_err(|e| VaultError::Storage(format!("parse: {}", e)))?
        } else {
            Tables::default()
        };

        Ok(Self {
            path,
            tables: RwLock::new(tables),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, VaultError> {
        self.tables.read().map_err(|_| poisoned())
    }

    fn persist(&self, tables: &Tables) -> Result<(), VaultError> {
        let json = serde_json::to_string_pretty(tables)?;
        // Atomic write: write to temp, then rename
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, json.as_bytes())
            .map_err(|e| VaultError::Storage(format!("write: {}", e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| VaultError::Storage(format!("rename: {}", e)))?;
        Ok(())
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let mut guard = self.tables.write().map_err(|_| poisoned())?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

impl StorageBackend for FileBackend {
    fn insert_account(&self, username: &str, hash: &CredentialHash) -> Result<Account, VaultError> {
        self.mutate(|t| t.insert_account(username, hash))
    }

    fn find_account(&self, id: AccountId) -> Result<Option<Account>, VaultError> {
        Ok(self.read()?.find_account(id))
    }

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>, VaultError> {
        Ok(self.read()?.find_account_by_username(username))
    }

    fn update_password_hash(&self, id: AccountId, hash: &CredentialHash) -> Result<(), VaultError> {
        self.mutate(|t| t.update_password_hash(id, hash))
    }

    fn insert_entry(&self, entry: NewEntry) -> Result<PasswordEntry, VaultError> {
        self.mutate(|t| Ok(t.insert_entry(entry)))
    }

    fn find_entry(&self, id: RecordId, owner: AccountId) -> Result<Option<PasswordEntry>, VaultError> {
        Ok(self.read()?.find_entry(id, owner))
    }

    fn list_entries(&self, owner: AccountId, filter: &SecretFilter) -> Result<Vec<PasswordEntry>, VaultError> {
        Ok(self.read()?.list_entries(owner, filter))
    }

    fn update_entry(&self, entry: &PasswordEntry) -> Result<(), VaultError> {
        self.mutate(|t| t.update_entry(entry))
    }

    fn delete_entry(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        self.mutate(|t| t.delete_entry(id, owner))
    }

    fn insert_transaction(&self, owner: AccountId, tx: NewTransaction) -> Result<Transaction, VaultError> {
        self.mutate(|t| Ok(t.insert_transaction(owner, tx)))
    }

    fn list_transactions(&self, owner: AccountId, period: Option<Period>) -> Result<Vec<Transaction>, VaultError> {
        Ok(self.read()?.list_transactions(owner, period))
    }

    fn delete_transaction(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        self.mutate(|t| t.delete_transaction(id, owner))
    }

    fn insert_totp(&self, owner: AccountId, totp: NewTotp) -> Result<TotpAccount, VaultError> {
        self.mutate(|t| Ok(t.insert_totp(owner, totp)))
    }

    fn list_totp(&self, owner: AccountId, search: Option<&str>) -> Result<Vec<TotpAccount>, VaultError> {
        Ok(self.read()?.list_totp(owner, search))
    }

    fn delete_totp(&self, id: RecordId, owner: AccountId) -> Result<(), VaultError> {
        self.mutate(|t| t.delete_totp(id, owner))
    }
}

/// Write `bytes` to a file readable only by the owner.
fn write_private(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    let mut options = std::fs::OpenOptions::new();
    options.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // A leftover temp file keeps its old mode
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}
