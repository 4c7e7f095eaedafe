//! Secret Cipher: seal a secret string into an `EncodedBlob`, and back.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::aead;
use crate::error::{OpenError, SealError};
use crate::key::CipherKey;
use crate::wire;

/// Persisted form of a secret: base64 of `nonce || ciphertext || tag`.
///
/// Opaque on purpose. The only way to get text back out is
/// [`SecretCipher::open`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedBlob(String);

impl EncodedBlob {
    /// Wrap text read back from storage. No validation happens until `open`.
    pub fn from_stored(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncodedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedBlob({} chars)", self.0.len())
    }
}

/// AES-256-GCM sealing under one static key.
///
/// Stateless apart from the key; share it behind an `Arc` across tasks.
#[derive(Debug, Clone)]
pub struct SecretCipher {
    key: CipherKey,
}

impl SecretCipher {
    pub fn new(key: CipherKey) -> Self {
        Self { key }
    }

    /// Encrypt `secret` under a fresh random nonce.
    pub fn seal(&self, secret: &str) -> Result<EncodedBlob, SealError> {
        let nonce = aead::nonce()?;
        let ct = aead::aead_seal(self.key.as_bytes(), &nonce, secret.as_bytes())?;
        let raw = wire::encode_blob(&nonce, &ct);
        Ok(EncodedBlob(wire::to_text(&raw)))
    }

    /// Decrypt a blob produced by `seal` under the same key.
    ///
    /// On any failure nothing of the plaintext is returned.
    pub fn open(&self, blob: &EncodedBlob) -> Result<String, OpenError> {
        let raw = wire::from_text(blob.as_str())?;
        let parts = wire::decode_blob(&raw)?;
        let pt = Zeroizing::new(aead::aead_open(
            self.key.as_bytes(),
            parts.nonce,
            parts.aead_ciphertext,
        )?);
        match std::str::from_utf8(&pt) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => Err(OpenError::Encoding),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> SecretCipher {
        SecretCipher::new(CipherKey::from_bytes(&[42u8; 32]).unwrap())
    }

    #[test]
    fn seal_open_roundtrip() {
        let c = cipher();
        let blob = c.seal("s3cr3t").unwrap();
        assert_eq!(c.open(&blob).unwrap(), "s3cr3t");
    }

    #[test]
    fn blob_does_not_contain_plaintext() {
        let c = cipher();
        let blob = c.seal("hunter2hunter2").unwrap();
        assert!(!blob.as_str().contains("hunter2"));
    }

    #[test]
    fn blob_debug_hides_content() {
        let c = cipher();
        let blob = c.seal("x").unwrap();
        let dbg = format!("{:?}", blob);
        assert!(!dbg.contains(blob.as_str()));
    }

    #[test]
    fn invalid_utf8_plaintext_is_rejected() {
        // Forge a blob whose authenticated plaintext is not UTF-8.
        let key = CipherKey::from_bytes(&[42u8; 32]).unwrap();
        let nonce = [3u8; wire::NONCE_BYTES];
        let ct = aead::aead_seal(key.as_bytes(), &nonce, &[0xff, 0xfe]).unwrap();
        let blob = EncodedBlob::from_stored(wire::to_text(&wire::encode_blob(&nonce, &ct)));
        assert_eq!(cipher().open(&blob).unwrap_err(), OpenError::Encoding);
    }

    #[test]
    fn serde_is_plain_string() {
        let blob = EncodedBlob::from_stored("QUJD");
        assert_eq!(serde_json::to_string(&blob).unwrap(), "\"QUJD\"");
    }
}
