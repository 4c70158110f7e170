//! Admin handlers guarded by permission codes.

use axum::Json;
use axum::extract::{Path, State};

use tokenguard_core::types::Identity;

use crate::dto::response::{AccountResponse, ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::authz::{JoinMode, require_permissions};
use crate::state::AppState;

/// GET /api/admin/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    require_permissions(&auth, "account:list", JoinMode::Or)?;

    let mut accounts: Vec<AccountResponse> = state
        .accounts
        .values()
        .map(|account| AccountResponse::from(&account.identity))
        .collect();
    accounts.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(ApiResponse::ok(accounts)))
}

/// DELETE /api/admin/sessions/{scene}/{id}
///
/// Evicts the session of a subject in a scene, invalidating all of its
/// tokens there.
pub async fn force_exit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((scene, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_permissions(&auth, "session:kick", JoinMode::Or)?;

    let evicted = state.auth.force_exit(&scene, &Identity::new(id.as_str())).await?;
    let message = if evicted {
        format!("Session of '{id}' in scene '{scene}' evicted")
    } else {
        format!("Scene '{scene}' keeps no sessions")
    };
    Ok(Json(ApiResponse::ok(MessageResponse::new(message))))
}

/// DELETE /api/admin/tokens/{jti}
pub async fn revoke_token(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(jti): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require_permissions(&auth, "session:kick,token:revoke", JoinMode::Or)?;

    state.sessions().revoke(&jti).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(format!(
        "Token '{jti}' revoked"
    )))))
}
