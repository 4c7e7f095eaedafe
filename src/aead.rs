//! AEAD: AES-256-GCM

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use getrandom::getrandom;

use crate::error::{OpenError, SealError};
use crate::wire::{AES_KEY_BYTES, NONCE_BYTES};

/// Generate a random 12-byte nonce. Used during encryption only.
///
/// Always drawn from the OS CSPRNG, never from a counter.
pub fn nonce() -> Result<[u8; NONCE_BYTES], SealError> {
    let mut n = [0u8; NONCE_BYTES];
    getrandom(&mut n).map_err(|_| SealError)?;
    Ok(n)
}

/// AEAD seal (encrypt path). Output is `ciphertext || tag`.
pub fn aead_seal(
    key: &[u8; AES_KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    plaintext: &[u8],
) -> Result<Vec<u8>, SealError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SealError)?;
    let n = Nonce::from_slice(nonce);
    cipher.encrypt(n, plaintext).map_err(|_| SealError)
}

/// AEAD open (decrypt path). Input is `ciphertext || tag`.
pub fn aead_open(
    key: &[u8; AES_KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
) -> Result<Vec<u8>, OpenError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| OpenError::Authentication)?;
    let n = Nonce::from_slice(nonce);
    cipher
        .decrypt(n, ciphertext)
        .map_err(|_| OpenError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_differ() {
        let a = nonce().unwrap();
        let b = nonce().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn seal_appends_tag() {
        let key = [7u8; AES_KEY_BYTES];
        let n = nonce().unwrap();
        let ct = aead_seal(&key, &n, b"abc").unwrap();
        assert_eq!(ct.len(), 3 + crate::wire::TAG_BYTES);
        assert_eq!(aead_open(&key, &n, &ct).unwrap(), b"abc");
    }

    #[test]
    fn wrong_nonce_fails() {
        let key = [7u8; AES_KEY_BYTES];
        let ct = aead_seal(&key, &[1u8; NONCE_BYTES], b"abc").unwrap();
        assert_eq!(
            aead_open(&key, &[2u8; NONCE_BYTES], &ct),
            Err(OpenError::Authentication)
        );
    }
}
