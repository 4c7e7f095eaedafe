//! Core types: identifiers, accounts, password entries, ledger and TOTP rows.

use chrono::{DateTime, NaiveDate, Utc};
use coffer_envelope::{CredentialHash, EncodedBlob};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value shown in place of every stored password outside of a reveal.
pub const REDACTION_MARKER: &str = "🔒 LOCKED";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Account identifier. Assigned by storage, starts at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row identifier inside one table. Assigned by storage, starts at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A login account. The hash is only ever passed to `verify_password`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub password_hash: CredentialHash,
    pub created_at: DateTime<Utc>,
}

/// What a successful login hands back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    #[serde(rename = "user_id")]
    pub account_id: AccountId,
    pub username: String,
}

impl From<&Account> for AccountSummary {
    fn from(a: &Account) -> Self {
        Self {
            account_id: a.id,
            username: a.username.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Password manager
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

/// A stored third-party credential. `password` is always sealed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PasswordEntry {
    pub id: RecordId,
    pub user_id: AccountId,
    pub category: String,
    pub account_name: String,
    pub username: String,
    pub password: EncodedBlob,
    pub status: EntryStatus,
}

/// Row to insert; storage assigns the ID.
#[derive(Clone, Debug)]
pub struct NewEntry {
    pub user_id: AccountId,
    pub category: String,
    pub account_name: String,
    pub username: String,
    pub password: EncodedBlob,
    pub status: EntryStatus,
}

/// Caller-supplied fields for store and update.
///
/// On update an empty `password` keeps the existing sealed value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SecretFields {
    #[serde(default)]
    pub category: String,
    pub account_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub status: EntryStatus,
}

/// Outward view of a `PasswordEntry`: the password field holds
/// [`REDACTION_MARKER`], never plaintext or ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedactedEntry {
    pub id: RecordId,
    pub user_id: AccountId,
    pub category: String,
    pub account_name: String,
    pub username: String,
    pub password: &'static str,
    pub status: EntryStatus,
}

impl From<&PasswordEntry> for RedactedEntry {
    fn from(e: &PasswordEntry) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            category: e.category.clone(),
            account_name: e.account_name.clone(),
            username: e.username.clone(),
            password: REDACTION_MARKER,
            status: e.status,
        }
    }
}

/// List filter. Empty strings mean "no filter"; category `All` too.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SecretFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl SecretFilter {
    pub(crate) fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "All")
    }

    pub(crate) fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: RecordId,
    pub user_id: AccountId,
    pub title: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTransaction {
    pub title: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: String,
    pub date: NaiveDate,
}

/// Calendar month filter for the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        date.year() == self.year && date.month() == self.month
    }
}

// ---------------------------------------------------------------------------
// TOTP
// ---------------------------------------------------------------------------

/// A stored TOTP seed. Returned to its owner so the client can derive codes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TotpAccount {
    pub id: RecordId,
    pub user_id: AccountId,
    pub service_name: String,
    pub secret_code: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTotp {
    pub service_name: String,
    pub secret_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_entry_never_carries_blob() {
        let entry = PasswordEntry {
            id: RecordId(1),
            user_id: AccountId(1),
            category: "Email".into(),
            account_name: "Gmail".into(),
            username: "a".into(),
            password: EncodedBlob::from_stored("c2VjcmV0LWJsb2I="),
            status: EntryStatus::Active,
        };
        let json = serde_json::to_string(&RedactedEntry::from(&entry)).unwrap();
        assert!(json.contains(REDACTION_MARKER));
        assert!(!json.contains("c2VjcmV0LWJsb2I="));
    }

    #[test]
    fn filter_ignores_all_and_blank() {
        let f = SecretFilter {
            category: Some("All".into()),
            search: Some("  ".into()),
        };
        assert_eq!(f.category(), None);
        assert_eq!(f.search(), None);

        let f = SecretFilter {
            category: Some("Email".into()),
            search: Some("gm".into()),
        };
        assert_eq!(f.category(), Some("Email"));
        assert_eq!(f.search(), Some("gm"));
    }

    #[test]
    fn period_bounds() {
        assert!(Period::new(2024, 0).is_none());
        assert!(Period::new(2024, 13).is_none());
        let p = Period::new(2024, 2).unwrap();
        assert!(p.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!p.contains(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
    }

    #[test]
    fn transaction_kind_wire_names() {
        let t: NewTransaction = serde_json::from_str(
            r#"{"title":"Salary","amount":100.5,"type":"income","category":"Work","date":"2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(t.kind, TransactionKind::Income);
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn status_defaults_to_active() {
        let f: SecretFields = serde_json::from_str(r#"{"account_name":"Gmail"}"#).unwrap();
        assert_eq!(f.status, EntryStatus::Active);
    }
}
