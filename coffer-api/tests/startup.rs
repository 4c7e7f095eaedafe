use coffer_api::build_vault;
use coffer_api::config::{AuditMode, KeySource, LogFormat, ServerConfig};
use coffer_envelope::{CipherKey, SecretCipher};
use coffer_vault::{FileAuditSink, IntegrityChainSink};

fn file_audit_config(dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        bind: "127.0.0.1".parse().unwrap(),
        port: 0,
        data_dir: dir.to_path_buf(),
        key_source: KeySource::File(dir.join("key")),
        log_format: LogFormat::Pretty,
        audit: AuditMode::File,
    }
}

#[tokio::test]
async fn audit_chain_spans_server_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_audit_config(dir.path());
    let key = CipherKey::generate();

    let vault = build_vault(&config, SecretCipher::new(key.clone())).unwrap();
    vault.register("alice", "pw1").await.unwrap();
    drop(vault);

    let vault = build_vault(&config, SecretCipher::new(key)).unwrap();
    vault.register("bob", "pw2").await.unwrap();
    vault.login("bob", "pw2").await.unwrap();

    let events = FileAuditSink::new(config.audit_log_path()).read_events().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].sequence, Some(2));
    assert!(IntegrityChainSink::verify_chain(&events));
}
