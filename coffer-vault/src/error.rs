//! Error type for vault operations.
//!
//! Messages are safe to show outward: no key material, no plaintext, no
//! ciphertext, no password hashes.

use coffer_envelope::{HashError, OpenError, SealError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Entity absent, or present but outside the caller's scope.
    #[error("not found")]
    NotFound,

    /// Credential check failed.
    #[error("unauthorized")]
    Unauthorized,

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("failed to encrypt secret")]
    Encryption,

    /// Stored blob failed to open: corruption or key mismatch.
    #[error("failed to decrypt stored secret")]
    Decryption,

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Whether this is our fault rather than the caller's.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Encryption | Self::Decryption | Self::Hash(_) | Self::Storage(_) | Self::Internal(_)
        )
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<SealError> for VaultError {
    fn from(_: SealError) -> Self {
        Self::Encryption
    }
}

impl From<OpenError> for VaultError {
    fn from(_: OpenError) -> Self {
        Self::Decryption
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(format!("serialize: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_errors_collapse_to_decryption() {
        for e in [OpenError::Malformed, OpenError::Authentication, OpenError::Encoding] {
            let v: VaultError = e.into();
            assert!(matches!(v, VaultError::Decryption));
            assert!(v.is_server_fault());
        }
    }

    #[test]
    fn caller_errors_are_not_server_faults() {
        assert!(!VaultError::NotFound.is_server_fault());
        assert!(!VaultError::Unauthorized.is_server_fault());
        assert!(!VaultError::validation("x").is_server_fault());
        assert!(!VaultError::Conflict("alice".into()).is_server_fault());
    }
}
