//! Static encryption key: 256 bits, loaded once, zeroized on drop.

use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use rand_core::{OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::KeyError;
use crate::wire::AES_KEY_BYTES;

/// The process-wide secret-sealing key.
///
/// Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    bytes: [u8; AES_KEY_BYTES],
}

impl CipherKey {
    /// Fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; AES_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; AES_KEY_BYTES] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidLength(bytes.len()))?;
        Ok(Self { bytes })
    }

    /// Standard base64 (padded or not); surrounding whitespace ignored.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let trimmed = encoded.trim().trim_end_matches('=');
        let decoded = Zeroizing::new(
            base64::engine::general_purpose::STANDARD_NO_PAD
                .decode(trimmed.as_bytes())
                .map_err(|_| KeyError::Encoding)?,
        );
        Self::from_bytes(&decoded)
    }

    /// Reads a base64 key from an environment variable.
    pub fn from_env_var(var: &str) -> Result<Self, KeyError> {
        let encoded = Zeroizing::new(
            std::env::var(var).map_err(|e| KeyError::Unreadable(format!("{}: {}", var, e)))?,
        );
        Self::from_base64(&encoded)
    }

    /// Reads a base64 key from a file.
    pub fn from_key_file(path: &Path) -> Result<Self, KeyError> {
        let content = Zeroizing::new(
            std::fs::read_to_string(path)
                .map_err(|e| KeyError::Unreadable(format!("{}: {}", path.display(), e)))?,
        );
        Self::from_base64(&content)
    }

    /// Padded base64, for writing a generated key to an operator's secret store.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; AES_KEY_BYTES] {
        &self.bytes
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_key() {
        assert_eq!(
            CipherKey::from_bytes(&[1u8; 16]).unwrap_err(),
            KeyError::InvalidLength(16)
        );
    }

    #[test]
    fn base64_roundtrip() {
        let key = CipherKey::generate();
        let text = key.to_base64();
        let back = CipherKey::from_base64(&text).unwrap();
        assert_eq!(key.as_bytes(), back.as_bytes());
    }

    #[test]
    fn accepts_unpadded_and_whitespace() {
        let key = CipherKey::from_bytes(&[9u8; 32]).unwrap();
        let padded = key.to_base64();
        let unpadded = format!("  {}\n", padded.trim_end_matches('='));
        let back = CipherKey::from_base64(&unpadded).unwrap();
        assert_eq!(back.as_bytes(), &[9u8; 32]);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(CipherKey::from_base64("***").unwrap_err(), KeyError::Encoding);
    }

    #[test]
    fn debug_is_redacted() {
        let key = CipherKey::from_bytes(&[0x41u8; 32]).unwrap();
        let dbg = format!("{:?}", key);
        assert_eq!(dbg, "CipherKey(<redacted>)");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coffer.key");
        let key = CipherKey::generate();
        std::fs::write(&path, format!("{}\n", key.to_base64().as_str())).unwrap();
        let loaded = CipherKey::from_key_file(&path).unwrap();
        assert_eq!(loaded.as_bytes(), key.as_bytes());
    }

    #[test]
    fn missing_env_var_is_unreadable() {
        let err = CipherKey::from_env_var("COFFER_TEST_KEY_DEFINITELY_UNSET").unwrap_err();
        assert!(matches!(err, KeyError::Unreadable(_)));
    }
}
