//! Auth handlers: login, refresh, logout, me.

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use tracing::warn;

use tokenguard_auth::{SessionManager, Token, TokenInput};
use tokenguard_core::error::AppError;

use crate::dto::request::LoginRequest;
use crate::dto::response::{ApiResponse, MeResponse, MessageResponse, TokenResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, RequestCtx};
use crate::state::AppState;

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn token_response(manager: &SessionManager, encoded: String, token: &Token) -> TokenResponse {
    let exp = token.expires_at().unwrap_or_default();
    TokenResponse {
        token: encoded,
        token_type: "Bearer".to_string(),
        expires_at: timestamp(exp),
        refresh_expires_at: timestamp(exp + manager.config().refresh_ttl as i64),
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    RequestCtx(mut ctx): RequestCtx,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    if req.id.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("id and password are required".into()));
    }

    let invalid = || AppError::authentication("Invalid id or password");
    let account = state.accounts.get(&req.id).ok_or_else(|| {
        warn!(id = %req.id, "Login for unknown account");
        invalid()
    })?;
    if !state
        .password_hasher
        .verify_password(&req.password, &account.password_hash)?
    {
        warn!(id = %req.id, "Login with wrong password");
        return Err(invalid().into());
    }

    let manager = state.sessions();
    let encoded = manager.login(&mut ctx, &account.identity, req.claims).await?;
    let token = manager.peek(&ctx, None)?;

    Ok(Json(ApiResponse::ok(token_response(manager, encoded, &token))))
}

/// POST /api/auth/refresh
///
/// Accepts expired tokens still inside their refresh window.
pub async fn refresh(
    State(state): State<AppState>,
    RequestCtx(mut ctx): RequestCtx,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let manager = state.sessions();
    let encoded = manager.refresh(&mut ctx, TokenInput::Request, false).await?;
    let token = manager.peek(&ctx, None)?;

    Ok(Json(ApiResponse::ok(token_response(manager, encoded, &token))))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    RequestCtx(ctx): RequestCtx,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.sessions().logout(&ctx, None).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Logged out"))))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::ok(MeResponse::from(&auth)))
}
