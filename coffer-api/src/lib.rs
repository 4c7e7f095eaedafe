//! Coffer API Server
//!
//! HTTP interface to the vault: accounts, the password manager with its
//! reveal endpoint, the ledger and TOTP seeds. See [`config`] for the
//! environment variables the binary reads.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use coffer_envelope::SecretCipher;
use coffer_vault::{
    AuditSinkSync, FileAuditSink, FileBackend, IntegrityChainSink, StorageBackend,
    TracingAuditSink, Vault, VaultError,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{AuditMode, ServerConfig};

pub struct AppState {
    pub vault: Vault,
}

pub type Shared = Arc<AppState>;

/// Build the vault the server runs on: file storage under the data
/// directory, the configured audit sink and the loaded key.
pub fn build_vault(config: &ServerConfig, cipher: SecretCipher) -> Result<Vault, VaultError> {
    let storage: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(&config.data_dir)?);
    let audit: Arc<dyn AuditSinkSync> = match config.audit {
        AuditMode::Tracing => Arc::new(TracingAuditSink),
        AuditMode::File => {
            let file_sink = FileAuditSink::new(config.audit_log_path());
            let last = file_sink.last_event()?;
            Arc::new(IntegrityChainSink::resume(Arc::new(file_sink), last.as_ref()))
        }
    };
    Ok(Vault::new(storage, audit, Arc::new(cipher)))
}

pub fn router(state: Shared) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/register", post(routes::register))
        .route("/api/login", post(routes::login))
        .route("/api/change-password", put(routes::change_password))
        .route(
            "/api/transactions",
            get(routes::list_transactions).post(routes::create_transaction),
        )
        .route("/api/transactions/:id", delete(routes::delete_transaction))
        .route("/api/totp", get(routes::list_totp).post(routes::create_totp))
        .route("/api/totp/:id", delete(routes::delete_totp))
        .route(
            "/api/passwordsManager",
            get(routes::list_secrets).post(routes::store_secret),
        )
        .route("/api/passwordsManager/reveal", post(routes::reveal_secret))
        .route(
            "/api/passwordsManager/:id",
            put(routes::update_secret).delete(routes::delete_secret),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
