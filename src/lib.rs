//! # Coffer Envelope
//!
//! Credential-at-rest protection for the Coffer vault.
//!
//! ## Quick Start
//!
//! ```rust
//! use coffer_envelope::{CipherKey, SecretCipher, hash_password, verify_password};
//!
//! let cipher = SecretCipher::new(CipherKey::generate());
//!
//! let blob = cipher.seal("s3cr3t").unwrap();
//! assert_eq!(cipher.open(&blob).unwrap(), "s3cr3t");
//!
//! let hash = hash_password("pw1").unwrap();
//! assert!(verify_password("pw1", &hash));
//! assert!(!verify_password("pw2", &hash));
//! ```
//!
//! ## Security Properties
//!
//! - **AEAD**: AES-256-GCM, tamper and wrong-key detection on every open
//! - **Fresh nonces**: 96 bits from the OS CSPRNG per seal, never a counter
//! - **Text-safe blobs**: standard base64 of `nonce || ciphertext || tag`
//! - **One-way credentials**: Argon2id PHC strings, constant-time verify
//! - **Key hygiene**: key zeroized on drop, redacted in `Debug`
//!
//! ## What's NOT Provided
//!
//! - Key rotation
//! - Per-record key derivation
//! - Rate limiting

#![deny(unsafe_code)]

mod aead;
mod cipher;
mod error;
mod key;
mod password;

// Blob layout constants are useful to tests and tooling but are not
// considered stable API.
#[doc(hidden)]
pub mod wire;

pub use cipher::{EncodedBlob, SecretCipher};
pub use error::{HashError, KeyError, OpenError, SealError};
pub use key::CipherKey;
pub use password::{hash_password, verify_password, CredentialHash};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
