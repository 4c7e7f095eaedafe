#![no_main]

use coffer_envelope::wire;
use coffer_envelope::{CipherKey, EncodedBlob, SecretCipher};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static CIPHER: Lazy<SecretCipher> = Lazy::new(|| SecretCipher::new(CipherKey::generate()));

fuzz_target!(|data: &[u8]| {
    // Arbitrary text straight from storage.
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = CIPHER.open(&EncodedBlob::from_stored(text));
    }

    // Well-formed base64 around arbitrary raw bytes.
    let blob = EncodedBlob::from_stored(wire::to_text(data));
    assert!(CIPHER.open(&blob).is_err() || data.len() >= wire::MIN_BLOB_BYTES);
});
