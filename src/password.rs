//! Credential Verifier: Argon2id password hashing.
//!
//! Every password-like value uses the same memory, iteration and parallelism
//! parameters. Output is a PHC string carrying algorithm, parameters, salt and
//! digest, so verification needs nothing else.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::HashError;

/// 19 MiB, 2 passes, 1 lane.
pub const MEMORY_COST_KIB: u32 = 19 * 1024;
pub const TIME_COST: u32 = 2;
pub const PARALLELISM: u32 = 1;

/// A stored one-way hash (PHC string).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Wrap a PHC string read back from storage.
    pub fn from_stored(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

fn argon2() -> Result<Argon2<'static>, HashError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password under a fresh random salt.
pub fn hash_password(password: &str) -> Result<CredentialHash, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = argon2()?
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(CredentialHash(phc))
}

/// Check a password against a stored hash.
///
/// Mismatch and malformed hashes both return `false`. The digest comparison
/// inside argon2 is constant-time.
pub fn verify_password(password: &str, hash: &CredentialHash) -> bool {
    let parsed = match PasswordHash::new(hash.as_str()) {
        Ok(p) => p,
        Err(_) => return false,
    };
    match argon2() {
        Ok(a) => a.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_and_verifies() {
        let hash = hash_password("pw1").unwrap();
        assert!(verify_password("pw1", &hash));
        assert!(!verify_password("pw2", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn salts_differ_per_call() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn phc_carries_parameters() {
        let hash = hash_password("pw").unwrap();
        assert!(hash.as_str().starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn malformed_hash_is_false() {
        assert!(!verify_password("pw", &CredentialHash::from_stored("not-a-phc")));
        assert!(!verify_password("pw", &CredentialHash::from_stored("")));
    }

    #[test]
    fn debug_is_redacted() {
        let hash = hash_password("pw").unwrap();
        assert!(!format!("{:?}", hash).contains("argon2"));
    }
}
