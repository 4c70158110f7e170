//! Authentication middleware with transparent refresh.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info};

use tokenguard_auth::{AuthError, TokenInput};
use tokenguard_core::error::AppError;

use crate::context::request_context;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Rejects requests without a valid token for the default scene.
///
/// An expired token that is still inside its refresh window is refreshed
/// when the scene has `auto_refresh` enabled. The request then proceeds
/// with the new token and the response carries it in the scene's token
/// header as `Bearer <token>`. A token that a concurrent request has just
/// refreshed is swapped for that request's token the same way. With
/// `auto_refresh` disabled the expiry surfaces as `402 Payment Required`.
///
/// On success the [`AuthUser`] and the request context are inserted into
/// the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let manager = Arc::clone(state.sessions());
    let header_name = manager.config().header_name.clone();
    let mut ctx = request_context(request.headers(), request.uri(), &header_name);

    let (token, refreshed) = match manager.validate(&ctx, None).await {
        Ok(token) => (token, None),
        Err(AuthError::TokenExpired(expired)) if manager.config().auto_refresh => {
            debug!(jti = expired.id().unwrap_or_default(), "Refreshing expired token");
            let fresh = manager
                .refresh(&mut ctx, TokenInput::Token(*expired), false)
                .await?;
            (manager.validate(&ctx, None).await?, Some(fresh))
        }
        // A concurrent request may have refreshed this token a moment ago;
        // refresh then yields the replacement or `Blacklisted` again.
        Err(AuthError::Blacklisted) if manager.config().auto_refresh => {
            let fresh = manager.refresh(&mut ctx, TokenInput::Request, false).await?;
            debug!(scene = %manager.scene(), "Using token from concurrent refresh");
            (manager.validate(&ctx, None).await?, Some(fresh))
        }
        Err(err) => return Err(err.into()),
    };

    let identity = manager.identity(&token).await?;
    let super_admin = manager.is_super_admin_identity(&identity).await?;
    request.extensions_mut().insert(AuthUser {
        scene: manager.scene().to_string(),
        identity,
        token,
        super_admin,
    });
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).await;

    if let Some(fresh) = refreshed {
        let name = HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| {
            AppError::configuration(format!("Invalid token header name '{header_name}': {e}"))
        })?;
        let value = HeaderValue::from_str(&format!("Bearer {fresh}"))
            .map_err(|e| AppError::internal(format!("Invalid token header value: {e}")))?;
        response.headers_mut().insert(name, value);
        info!(scene = %manager.scene(), "Token refreshed transparently");
    }

    Ok(response)
}
