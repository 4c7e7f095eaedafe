//! Unified error types for Coffer Envelope.
//!
//! Errors are deliberately coarse. None of them carries key bytes, nonce
//! bytes or partial plaintext, so they are safe to log and safe to map onto
//! an outward status.

use core::fmt;

/// `seal` failed: bad key material or the OS RNG refused to produce a nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealError;

impl fmt::Display for SealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encryption failed")
    }
}

impl std::error::Error for SealError {}

/// Why `open` rejected a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenError {
    /// Not base64, or shorter than nonce + tag.
    Malformed,
    /// Tag did not verify: tampered blob or wrong key.
    Authentication,
    /// Authenticated, but the plaintext is not UTF-8.
    Encoding,
}

impl OpenError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, OpenError::Malformed)
    }
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::Malformed => write!(f, "decryption failed: malformed blob"),
            OpenError::Authentication => write!(f, "decryption failed"),
            OpenError::Encoding => write!(f, "decryption failed: invalid utf-8"),
        }
    }
}

impl std::error::Error for OpenError {}

/// Password hashing failed (RNG or parameter failure). Not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashError(pub(crate) String);

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl std::error::Error for HashError {}

impl From<argon2::password_hash::Error> for HashError {
    fn from(e: argon2::password_hash::Error) -> Self {
        HashError(e.to_string())
    }
}

impl From<argon2::Error> for HashError {
    fn from(e: argon2::Error) -> Self {
        HashError(e.to_string())
    }
}

/// Key material could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Decoded key is not 32 bytes.
    InvalidLength(usize),
    /// Source text is not valid base64.
    Encoding,
    /// Environment variable or file could not be read.
    Unreadable(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidLength(n) => {
                write!(f, "invalid key length: expected 32 bytes, got {}", n)
            }
            KeyError::Encoding => write!(f, "key is not valid base64"),
            KeyError::Unreadable(msg) => write!(f, "key source unreadable: {}", msg),
        }
    }
}

impl std::error::Error for KeyError {}
