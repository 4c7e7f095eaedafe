//! Blob wire format
//!
//! Format:
//!   base64_std( nonce[12] || aead_ct[len(plaintext)] || tag[16] )
//!
//! Padded standard alphabet, so the blob fits a text column and a JSON string
//! unchanged.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::OpenError;

pub const NONCE_BYTES: usize = 12;
pub const TAG_BYTES: usize = 16;
pub const AES_KEY_BYTES: usize = 32;

/// Minimum decoded size: nonce + tag (empty plaintext).
pub const MIN_BLOB_BYTES: usize = NONCE_BYTES + TAG_BYTES; // 28

/// Borrowed view of a decoded blob.
#[derive(Debug, Clone, Copy)]
pub struct BlobComponents<'a> {
    pub nonce: &'a [u8; NONCE_BYTES],
    /// `ciphertext || tag`
    pub aead_ciphertext: &'a [u8],
}

/// Concatenate nonce and AEAD output into raw blob bytes.
pub fn encode_blob(nonce: &[u8; NONCE_BYTES], aead_ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(NONCE_BYTES + aead_ciphertext.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(aead_ciphertext);
    out
}

/// Split raw blob bytes. Rejects anything that cannot hold a nonce and a tag.
pub fn decode_blob(data: &[u8]) -> Result<BlobComponents<'_>, OpenError> {
    if data.len() < MIN_BLOB_BYTES {
        return Err(OpenError::Malformed);
    }

    let nonce: &[u8; NONCE_BYTES] = data[..NONCE_BYTES]
        .try_into()
        .map_err(|_| OpenError::Malformed)?;

    Ok(BlobComponents {
        nonce,
        aead_ciphertext: &data[NONCE_BYTES..],
    })
}

pub fn to_text(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

pub fn from_text(text: &str) -> Result<Vec<u8>, OpenError> {
    STANDARD
        .decode(text.as_bytes())
        .map_err(|_| OpenError::Malformed)
}
