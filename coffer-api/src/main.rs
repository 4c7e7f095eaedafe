use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use coffer_api::config::{LogFormat, ServerConfig};
use coffer_api::{build_vault, router, AppState};
use coffer_envelope::SecretCipher;

const DEFAULT_FILTER: &str = "coffer_api=info,coffer_vault=info,tower_http=info";

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    let cipher = match config.load_key() {
        Ok(key) => SecretCipher::new(key),
        Err(e) => {
            tracing::error!(error = %e, "cannot load encryption key");
            return ExitCode::FAILURE;
        }
    };

    let vault = match build_vault(&config, cipher) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, data_dir = %config.data_dir.display(), "cannot open vault storage");
            return ExitCode::FAILURE;
        }
    };

    let app = router(Arc::new(AppState { vault }));
    let addr = SocketAddr::new(config.bind, config.port);

    tracing::info!(%addr, "starting Coffer API Server v{}", coffer_envelope::VERSION);
    tracing::info!(data_dir = %config.data_dir.display(), audit = ?config.audit, "data directory");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "bind failed");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
