//! Audit logging: every account and secret operation emits a structured event.
//!
//! Events carry identifiers and outcomes only. Passwords, plaintext secrets,
//! blobs and hashes never appear in an event.

use crate::error::VaultError;
use crate::types::{AccountId, RecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Audit events
// ---------------------------------------------------------------------------

/// Furthest point a reveal attempt reached before it was denied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealStage {
    Unauthenticated,
    IdentityVerified,
    OwnershipChecked,
}

/// What happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuditAction {
    AccountRegistered,
    LoginSucceeded,
    LoginFailed,
    PasswordChanged,
    PasswordChangeRejected,
    SecretStored,
    SecretUpdated,
    SecretDeleted,
    SecretRevealed,
    RevealDenied { stage: RevealStage },
    TransactionCreated,
    TransactionDeleted,
    TotpCreated,
    TotpDeleted,
}

/// A structured audit event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    /// Acting account, when known.
    pub account_id: Option<AccountId>,
    /// Row the action touched.
    pub record_id: Option<RecordId>,
    pub action: AuditAction,
    pub success: bool,
    /// Additional context. Never a secret.
    pub detail: Option<String>,
    /// Monotonic sequence number (populated by integrity chain sink).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// SHA-256 of the previous event's JSON (populated by integrity chain sink).
    /// First event in chain has prev_hash = SHA-256("coffer-audit-genesis").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
}

impl AuditEvent {
    pub fn new(action: AuditAction) -> Self {
        Self {
            timestamp: Utc::now(),
            account_id: None,
            record_id: None,
            action,
            success: true,
            detail: None,
            sequence: None,
            prev_hash: None,
        }
    }

    /// Event attributed to an account.
    pub fn account_event(account_id: AccountId, action: AuditAction) -> Self {
        Self::new(action).with_account(account_id)
    }

    /// Event attributed to an account and one of its rows.
    pub fn record_event(account_id: AccountId, record_id: RecordId, action: AuditAction) -> Self {
        Self::account_event(account_id, action).with_record(record_id)
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_record(mut self, record_id: RecordId) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.success = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Audit sink trait
// ---------------------------------------------------------------------------

/// Where audit events go. Implement this for your SIEM/log system.
///
/// Synchronous so the vault can record from any context.
/// For async sinks, use interior mutability (e.g., channel-based).
pub trait AuditSinkSync: Send + Sync {
    fn record(&self, event: AuditEvent);
}

// ---------------------------------------------------------------------------
// Built-in sinks
// ---------------------------------------------------------------------------

/// Logs events via the `tracing` crate.
pub struct TracingAuditSink;

impl AuditSinkSync for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "coffer_vault::audit",
            timestamp = %event.timestamp,
            account_id = ?event.account_id,
            record_id = ?event.record_id,
            action = ?event.action,
            success = event.success,
            detail = ?event.detail,
            "audit"
        );
    }
}

/// Collects events in memory (for tests and inspection).
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for_account(&self, account_id: AccountId) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.account_id == Some(account_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSinkSync for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Writes JSON events to a file (append-only, one per line).
pub struct FileAuditSink {
    path: std::path::PathBuf,
}

impl FileAuditSink {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every event back. A missing file is an empty log.
    pub fn read_events(&self) -> Result<Vec<AuditEvent>, VaultError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VaultError::Storage(format!("read audit log: {}", e))),
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l)
                    .map_err(|e| VaultError::Storage(format!("parse audit log: {}", e)))
            })
            .collect()
    }

    /// The most recent event, if any.
    pub fn last_event(&self) -> Result<Option<AuditEvent>, VaultError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::Storage(format!("read audit log: {}", e))),
        };
        match text.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => serde_json::from_str(line)
                .map(Some)
                .map_err(|e| VaultError::Storage(format!("parse audit log: {}", e))),
            None => Ok(None),
        }
    }
}

impl AuditSinkSync for FileAuditSink {
    fn record(&self, event: AuditEvent) {
        use std::io::Write;
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "audit event serialize failed");
                return;
            }
        };
        let written = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", json));
        if let Err(e) = written {
            tracing::warn!(path = %self.path.display(), error = %e, "audit write failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Integrity chain sink (tamper-evident audit log)
// ---------------------------------------------------------------------------

/// Wraps any `AuditSinkSync` and adds a SHA-256 hash chain.
///
/// Each event gets a monotonic `sequence` number and a `prev_hash`
/// containing the SHA-256 hex digest of the previous event's JSON.
/// Replaying the log and recomputing hashes detects any insertion,
/// deletion or modification of events.
pub struct IntegrityChainSink {
    inner: Arc<dyn AuditSinkSync>,
    state: Mutex<ChainState>,
}

struct ChainState {
    sequence: u64,
    prev_hash: String,
}

pub const GENESIS_SEED: &[u8] = b"coffer-audit-genesis";

fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(data))
}

impl IntegrityChainSink {
    pub fn new(inner: Arc<dyn AuditSinkSync>) -> Self {
        Self::resume(inner, None)
    }

    /// Continue an existing chain after `last`, the newest event already
    /// recorded. `None` starts at genesis.
    pub fn resume(inner: Arc<dyn AuditSinkSync>, last: Option<&AuditEvent>) -> Self {
        let (sequence, prev_hash) = match last {
            Some(event) => (
                event.sequence.map_or(0, |s| s + 1),
                serde_json::to_string(event)
                    .map(|json| sha256_hex(json.as_bytes()))
                    .unwrap_or_else(|_| sha256_hex(GENESIS_SEED)),
            ),
            None => (0, sha256_hex(GENESIS_SEED)),
        };
        Self {
            inner,
            state: Mutex::new(ChainState {
                sequence,
                prev_hash,
            }),
        }
    }

    /// Check that `events` form an unbroken chain from genesis.
    pub fn verify_chain(events: &[AuditEvent]) -> bool {
        let mut expected = sha256_hex(GENESIS_SEED);
        for (i, event) in events.iter().enumerate() {
            if event.sequence != Some(i as u64) || event.prev_hash.as_deref() != Some(expected.as_str()) {
                return false;
            }
            match serde_json::to_string(event) {
                Ok(json) => expected = sha256_hex(json.as_bytes()),
                Err(_) => return false,
            }
        }
        true
    }
}

impl AuditSinkSync for IntegrityChainSink {
    fn record(&self, mut event: AuditEvent) {
        {
            let mut state = match self.state.lock() {
                Ok(state) => state,
                Err(poisoned) => poisoned.into_inner(),
            };

            event.sequence = Some(state.sequence);
            event.prev_hash = Some(state.prev_hash.clone());

            // Hash covers the complete event, chain fields included
            if let Ok(json) = serde_json::to_string(&event) {
                state.prev_hash = sha256_hex(json.as_bytes());
            }
            state.sequence += 1;
        }
        self.inner.record(event);
    }
}
