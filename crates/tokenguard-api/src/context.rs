//! Builds a [`RequestContext`] from HTTP request parts.

use axum::extract::Query;
use axum::http::{HeaderMap, Uri, header};
use serde::Deserialize;

use tokenguard_auth::RequestContext;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Collects the token header (`header_name`), the `token` query parameter,
/// the user agent and the host.
pub fn request_context(headers: &HeaderMap, uri: &Uri, header_name: &str) -> RequestContext {
    let mut ctx = RequestContext::new()
        .with_user_agent(header_str(headers, header::USER_AGENT.as_str()).unwrap_or_default())
        .with_host(
            header_str(headers, header::HOST.as_str())
                .or_else(|| uri.host())
                .unwrap_or_default(),
        );

    if let Some(value) = header_str(headers, header_name) {
        ctx = ctx.with_authorization(value);
    }
    if let Ok(Query(TokenQuery { token: Some(token) })) = Query::<TokenQuery>::try_from_uri(uri) {
        ctx = ctx.with_query_token(token);
    }
    ctx
}
