use coffer_envelope::wire::{self, MIN_BLOB_BYTES, NONCE_BYTES, TAG_BYTES};
use coffer_envelope::{CipherKey, EncodedBlob, OpenError, SecretCipher};
use proptest::prelude::*;

fn setup() -> SecretCipher {
    SecretCipher::new(CipherKey::generate())
}

#[test]
fn roundtrip_basic() {
    let c = setup();
    let blob = c.seal("correct horse battery staple").unwrap();
    assert_eq!(c.open(&blob).unwrap(), "correct horse battery staple");
}

#[test]
fn roundtrip_empty_secret() {
    let c = setup();
    let blob = c.seal("").unwrap();
    assert_eq!(c.open(&blob).unwrap(), "");
}

#[test]
fn roundtrip_unicode_secret() {
    let c = setup();
    let secret = "pässwörd 🔑 日本語";
    let blob = c.seal(secret).unwrap();
    assert_eq!(c.open(&blob).unwrap(), secret);
}

#[test]
fn roundtrip_large_secret() {
    let c = setup();
    let secret = "x".repeat(65536);
    let blob = c.seal(&secret).unwrap();
    assert_eq!(c.open(&blob).unwrap(), secret);
}

#[test]
fn same_plaintext_gives_different_blobs() {
    let c = setup();
    let a = c.seal("s3cr3t").unwrap();
    let b = c.seal("s3cr3t").unwrap();
    assert_ne!(a, b);

    let ra = wire::from_text(a.as_str()).unwrap();
    let rb = wire::from_text(b.as_str()).unwrap();
    assert_ne!(&ra[..NONCE_BYTES], &rb[..NONCE_BYTES]);
}

#[test]
fn blob_length_matches_layout() {
    let c = setup();
    let blob = c.seal("abcd").unwrap();
    let raw = wire::from_text(blob.as_str()).unwrap();
    assert_eq!(raw.len(), NONCE_BYTES + 4 + TAG_BYTES);
}

#[test]
fn wrong_key_fails() {
    let c1 = setup();
    let c2 = setup();
    let blob = c1.seal("data").unwrap();
    assert_eq!(c2.open(&blob), Err(OpenError::Authentication));
}

#[test]
fn truncated_blob_is_malformed() {
    let c = setup();
    for len in 0..MIN_BLOB_BYTES {
        let text = wire::to_text(&vec![0u8; len]);
        let err = c.open(&EncodedBlob::from_stored(text)).unwrap_err();
        assert!(err.is_malformed(), "len {} gave {:?}", len, err);
    }
}

#[test]
fn truncated_real_blob_fails() {
    let c = setup();
    let blob = c.seal("abcdef").unwrap();
    let raw = wire::from_text(blob.as_str()).unwrap();
    for cut in 0..raw.len() {
        let text = wire::to_text(&raw[..cut]);
        assert!(c.open(&EncodedBlob::from_stored(text)).is_err(), "cut at {}", cut);
    }
}

#[test]
fn non_base64_is_malformed() {
    let c = setup();
    for bad in ["", "%%%%", "🔒 LOCKED", "abc"] {
        let err = c.open(&EncodedBlob::from_stored(bad)).unwrap_err();
        assert_eq!(err, OpenError::Malformed, "input {:?}", bad);
    }
}

#[test]
fn error_messages_leak_nothing() {
    let c = setup();
    let blob = c.seal("topsecret").unwrap();
    let mut raw = wire::from_text(blob.as_str()).unwrap();
    raw[NONCE_BYTES] ^= 0x01;
    let err = c
        .open(&EncodedBlob::from_stored(wire::to_text(&raw)))
        .unwrap_err();
    let msg = err.to_string();
    assert!(!msg.contains("topsecret"));
    assert_eq!(msg, "decryption failed");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_roundtrip(s in ".*") {
        let c = SecretCipher::new(CipherKey::from_bytes(&[5u8; 32]).unwrap());
        let blob = c.seal(&s).unwrap();
        prop_assert_eq!(c.open(&blob).unwrap(), s);
    }

    #[test]
    fn prop_any_byte_flip_is_detected(s in ".{0,64}", idx in any::<prop::sample::Index>(), bit in 0u8..8) {
        let c = SecretCipher::new(CipherKey::from_bytes(&[6u8; 32]).unwrap());
        let blob = c.seal(&s).unwrap();
        let mut raw = wire::from_text(blob.as_str()).unwrap();
        let i = idx.index(raw.len());
        raw[i] ^= 1 << bit;
        let tampered = EncodedBlob::from_stored(wire::to_text(&raw));
        prop_assert_eq!(c.open(&tampered), Err(OpenError::Authentication));
    }

    #[test]
    fn prop_open_never_panics(text in "[A-Za-z0-9+/=]{0,128}") {
        let c = SecretCipher::new(CipherKey::from_bytes(&[7u8; 32]).unwrap());
        let _ = c.open(&EncodedBlob::from_stored(text));
    }
}
