//! HTTP error responses: `{ "error": "..." }` with a status derived from
//! the vault error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coffer_vault::VaultError;
use serde::Serialize;

#[derive(Serialize, Clone, Debug)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

fn status_for(e: &VaultError) -> StatusCode {
    match e {
        VaultError::NotFound => StatusCode::NOT_FOUND,
        VaultError::Unauthorized => StatusCode::UNAUTHORIZED,
        VaultError::Conflict(_) => StatusCode::CONFLICT,
        VaultError::Validation(_) => StatusCode::BAD_REQUEST,
        VaultError::Encryption
        | VaultError::Decryption
        | VaultError::Hash(_)
        | VaultError::Storage(_)
        | VaultError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<VaultError> for ApiError {
    fn from(e: VaultError) -> Self {
        if e.is_server_fault() {
            // Detail stays in the server log.
            tracing::error!(error = %e, "request failed");
            return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        }
        Self::new(status_for(&e), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
