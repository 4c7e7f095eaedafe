//! Server configuration from environment variables.
//!
//!   COFFER_PORT                 - Listen port (default: 8081)
//!   COFFER_BIND                 - Listen address (default: 0.0.0.0)
//!   COFFER_DATA_DIR             - Persistent data directory (default: ./coffer-data)
//!   COFFER_ENCRYPTION_KEY       - Base64 256-bit secret-sealing key
//!   COFFER_ENCRYPTION_KEY_FILE  - File holding the base64 key (used when the above is unset)
//!   COFFER_LOG_FORMAT           - "json" for structured logging, "pretty" for dev
//!   COFFER_AUDIT                - "tracing" (default) or "file" (hash-chained JSON lines)

use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

use coffer_envelope::{CipherKey, KeyError};
use thiserror::Error;
use zeroize::Zeroizing;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_DATA_DIR: &str = "./coffer-data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("no encryption key: set COFFER_ENCRYPTION_KEY or COFFER_ENCRYPTION_KEY_FILE")]
    MissingKey,

    #[error("encryption key rejected: {0}")]
    Key(#[from] KeyError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditMode {
    Tracing,
    File,
}

/// Where the sealing key comes from. The inline form is wiped on drop.
#[derive(Clone)]
pub enum KeySource {
    Inline(Zeroizing<String>),
    File(PathBuf),
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("Inline(<redacted>)"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub key_source: KeySource,
    pub log_format: LogFormat,
    pub audit: AuditMode,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port: u16 = match get("COFFER_PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "COFFER_PORT",
                expected: "port number",
                value: v,
            })?,
            None => DEFAULT_PORT,
        };

        let bind: IpAddr = match get("COFFER_BIND") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "COFFER_BIND",
                expected: "IP address",
                value: v,
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let data_dir = get("COFFER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let key_source = match (get("COFFER_ENCRYPTION_KEY"), get("COFFER_ENCRYPTION_KEY_FILE")) {
            (Some(inline), _) => KeySource::Inline(Zeroizing::new(inline)),
            (None, Some(path)) => KeySource::File(PathBuf::from(path)),
            (None, None) => return Err(ConfigError::MissingKey),
        };

        let log_format = match get("COFFER_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "COFFER_LOG_FORMAT",
                    expected: "log format (json|pretty)",
                    value: other.to_string(),
                })
            }
        };

        let audit = match get("COFFER_AUDIT").as_deref() {
            None | Some("tracing") => AuditMode::Tracing,
            Some("file") => AuditMode::File,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "COFFER_AUDIT",
                    expected: "audit mode (tracing|file)",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind,
            port,
            data_dir,
            key_source,
            log_format,
            audit,
        })
    }

    /// Decode the configured key. Fails on bad base64 or a length other than 32 bytes.
    pub fn load_key(&self) -> Result<CipherKey, ConfigError> {
        let key = match &self.key_source {
            KeySource::Inline(encoded) => CipherKey::from_base64(encoded)?,
            KeySource::File(path) => CipherKey::from_key_file(path)?,
        };
        Ok(key)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.data_dir.join("coffer-audit.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    fn key_b64() -> String {
        CipherKey::generate().to_base64().to_string()
    }

    #[test]
    fn defaults() {
        let key = key_b64();
        let cfg = ServerConfig::from_lookup(lookup(&[("COFFER_ENCRYPTION_KEY", key.as_str())])).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.bind, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(cfg.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.audit, AuditMode::Tracing);
        assert!(cfg.load_key().is_ok());
    }

    #[test]
    fn missing_key_is_an_error() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingKey)
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("COFFER_ENCRYPTION_KEY", "   ")])),
            Err(ConfigError::MissingKey)
        ));
    }

    #[test]
    fn short_key_rejected_at_load() {
        let cfg = ServerConfig::from_lookup(lookup(&[("COFFER_ENCRYPTION_KEY", "c2hvcnQ=")])).unwrap();
        assert!(matches!(cfg.load_key(), Err(ConfigError::Key(_))));
    }

    #[test]
    fn key_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coffer.key");
        std::fs::write(&path, format!("{}\n", key_b64())).unwrap();

        let cfg = ServerConfig::from_lookup(lookup(&[(
            "COFFER_ENCRYPTION_KEY_FILE",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        assert!(matches!(cfg.key_source, KeySource::File(_)));
        assert!(cfg.load_key().is_ok());
    }

    #[test]
    fn invalid_values_are_reported() {
        let key = key_b64();
        let err = ServerConfig::from_lookup(lookup(&[
            ("COFFER_ENCRYPTION_KEY", key.as_str()),
            ("COFFER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("COFFER_PORT"));

        assert!(ServerConfig::from_lookup(lookup(&[
            ("COFFER_ENCRYPTION_KEY", key.as_str()),
            ("COFFER_AUDIT", "syslog"),
        ]))
        .is_err());
    }

    #[test]
    fn debug_hides_inline_key() {
        let key = key_b64();
        let cfg = ServerConfig::from_lookup(lookup(&[("COFFER_ENCRYPTION_KEY", key.as_str())])).unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains(&key));
        assert!(printed.contains("<redacted>"));
    }
}
