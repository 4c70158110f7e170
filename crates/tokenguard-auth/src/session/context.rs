//! Request-scoped state threaded through the session engine.

use crate::token::codec::strip_bearer;

/// Everything the session engine needs to know about the current request,
/// plus the two request-scoped token slots.
///
/// The login slot holds a token minted by `login` during this request; the
/// refresh slot holds a token minted by `refresh`. Both take priority over
/// the token presented by the client so that later checks in the same
/// request see the newest token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    authorization: Option<String>,
    query_token: Option<String>,
    user_agent: String,
    host: String,
    login_token: Option<String>,
    refresh_token: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of the configured token header.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Value of the `token` query parameter.
    pub fn with_query_token(mut self, value: impl Into<String>) -> Self {
        self.query_token = Some(value.into());
        self
    }

    pub fn with_user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent = value.into();
        self
    }

    pub fn with_host(mut self, value: impl Into<String>) -> Self {
        self.host = value.into();
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn login_token(&self) -> Option<&str> {
        self.login_token.as_deref()
    }

    pub fn set_login_token(&mut self, token: impl Into<String>) {
        self.login_token = Some(token.into());
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn set_refresh_token(&mut self, token: impl Into<String>) {
        self.refresh_token = Some(token.into());
    }

    /// Resolves the token to validate, in priority order: the explicit
    /// argument, the refresh slot, the login slot, the header (with an
    /// optional `Bearer ` prefix), then the `token` query parameter.
    /// Blank candidates are skipped.
    pub fn bearer<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        [
            explicit,
            self.refresh_token.as_deref(),
            self.login_token.as_deref(),
            self.authorization.as_deref(),
            self.query_token.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(strip_bearer)
        .find(|candidate| !candidate.is_empty())
    }
}
