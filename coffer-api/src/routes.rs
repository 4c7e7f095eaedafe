//! Route handlers. Each one unpacks the request, calls the vault, and
//! shapes the JSON answer.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use coffer_vault::*;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::Shared;

type ApiResult<T> = Result<T, ApiError>;

fn message(text: &'static str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": text }))
}

fn require_owner(user_id: Option<u64>) -> ApiResult<AccountId> {
    match user_id {
        Some(id) if id > 0 => Ok(AccountId(id)),
        _ => Err(ApiError::bad_request("user_id is required")),
    }
}

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CredentialsReq {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    #[serde(flatten)]
    account: AccountSummary,
}

#[derive(Deserialize)]
pub struct ChangePasswordReq {
    user_id: Option<u64>,
    old_password: String,
    new_password: String,
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    user_id: Option<u64>,
}

#[derive(Deserialize)]
pub struct TransactionQuery {
    user_id: Option<u64>,
    month: Option<u32>,
    year: Option<i32>,
}

#[derive(Deserialize)]
pub struct TotpQuery {
    user_id: Option<u64>,
    search: Option<String>,
}

// No flatten: urlencoded values all arrive as strings.
#[derive(Deserialize)]
pub struct SecretQuery {
    user_id: Option<u64>,
    category: Option<String>,
    search: Option<String>,
}

#[derive(Deserialize)]
pub struct Owned<T> {
    user_id: Option<u64>,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
pub struct RevealReq {
    id: u64,
    user_id: Option<u64>,
    password: String,
}

#[derive(Serialize)]
struct RevealResponse {
    password: String,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "version": coffer_envelope::VERSION }))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub async fn register(
    State(state): State<Shared>,
    ApiJson(req): ApiJson<CredentialsReq>,
) -> ApiResult<impl IntoResponse> {
    state.vault.register(&req.username, &req.password).await?;
    Ok((StatusCode::CREATED, message("User registered successfully")))
}

pub async fn login(
    State(state): State<Shared>,
    ApiJson(req): ApiJson<CredentialsReq>,
) -> ApiResult<impl IntoResponse> {
    // Unknown user and wrong password look the same from outside.
    let account = state
        .vault
        .login(&req.username, &req.password)
        .await
        .map_err(|e| match e {
            VaultError::NotFound | VaultError::Unauthorized => {
                ApiError::unauthorized("invalid username or password")
            }
            other => other.into(),
        })?;
    Ok(Json(LoginResponse {
        message: "Login successful",
        account,
    }))
}

pub async fn change_password(
    State(state): State<Shared>,
    ApiJson(req): ApiJson<ChangePasswordReq>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(req.user_id)?;
    state
        .vault
        .change_password(owner, &req.old_password, &req.new_password)
        .await?;
    Ok(message("Password updated successfully"))
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

pub async fn list_transactions(
    State(state): State<Shared>,
    ApiQuery(q): ApiQuery<TransactionQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(q.user_id)?;
    let period = match (q.year, q.month) {
        (Some(year), Some(month)) => Some(
            Period::new(year, month).ok_or_else(|| ApiError::bad_request("month must be 1-12"))?,
        ),
        _ => None,
    };
    Ok(Json(state.vault.list_transactions(owner, period).await?))
}

pub async fn create_transaction(
    State(state): State<Shared>,
    ApiJson(req): ApiJson<Owned<NewTransaction>>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(req.user_id)?;
    let tx = state.vault.create_transaction(owner, req.body).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn delete_transaction(
    State(state): State<Shared>,
    ApiPath(id): ApiPath<u64>,
    ApiQuery(q): ApiQuery<OwnerQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(q.user_id)?;
    state.vault.delete_transaction(owner, RecordId(id)).await?;
    Ok(message("Transaction deleted"))
}

// ---------------------------------------------------------------------------
// TOTP
// ---------------------------------------------------------------------------

pub async fn list_totp(
    State(state): State<Shared>,
    ApiQuery(q): ApiQuery<TotpQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(q.user_id)?;
    Ok(Json(state.vault.list_totp(owner, q.search.as_deref()).await?))
}

pub async fn create_totp(
    State(state): State<Shared>,
    ApiJson(req): ApiJson<Owned<NewTotp>>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(req.user_id)?;
    let totp = state.vault.create_totp(owner, req.body).await?;
    Ok((StatusCode::CREATED, Json(totp)))
}

pub async fn delete_totp(
    State(state): State<Shared>,
    ApiPath(id): ApiPath<u64>,
    ApiQuery(q): ApiQuery<OwnerQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(q.user_id)?;
    state.vault.delete_totp(owner, RecordId(id)).await?;
    Ok(message("TOTP account deleted"))
}

// ---------------------------------------------------------------------------
// Password manager
// ---------------------------------------------------------------------------

pub async fn list_secrets(
    State(state): State<Shared>,
    ApiQuery(q): ApiQuery<SecretQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(q.user_id)?;
    let filter = SecretFilter {
        category: q.category,
        search: q.search,
    };
    Ok(Json(state.vault.list_secrets(owner, &filter).await?))
}

pub async fn store_secret(
    State(state): State<Shared>,
    ApiJson(req): ApiJson<Owned<SecretFields>>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(req.user_id)?;
    let entry = state.vault.store_secret(owner, req.body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_secret(
    State(state): State<Shared>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(req): ApiJson<Owned<SecretFields>>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(req.user_id)?;
    let entry = state.vault.update_secret(owner, RecordId(id), req.body).await?;
    Ok(Json(entry))
}

pub async fn delete_secret(
    State(state): State<Shared>,
    ApiPath(id): ApiPath<u64>,
    ApiQuery(q): ApiQuery<OwnerQuery>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(q.user_id)?;
    state.vault.delete_secret(owner, RecordId(id)).await?;
    Ok(message("Password entry deleted"))
}

pub async fn reveal_secret(
    State(state): State<Shared>,
    ApiJson(req): ApiJson<RevealReq>,
) -> ApiResult<impl IntoResponse> {
    let owner = require_owner(req.user_id)?;
    let password = state
        .vault
        .reveal_secret(owner, RecordId(req.id), &req.password)
        .await?;
    Ok(Json(RevealResponse { password }))
}
