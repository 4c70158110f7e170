//! `RequestCtx` extractor: the session engine's view of the request.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tokenguard_auth::RequestContext;

use crate::context::request_context;
use crate::error::ApiError;
use crate::state::AppState;

/// Request context for handlers that call the session engine directly.
///
/// Reuses the context stored by the auth middleware when present, so the
/// refresh slot filled by a transparent refresh is visible to the handler.
#[derive(Debug, Clone)]
pub struct RequestCtx(pub RequestContext);

impl FromRequestParts<AppState> for RequestCtx {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(Self(ctx.clone()));
        }
        let header_name = &state.sessions().config().header_name;
        Ok(Self(request_context(&parts.headers, &parts.uri, header_name)))
    }
}
