//! Session engine for one scene: issue, validate, refresh, logout, revoke.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use tokenguard_core::config::SceneConfig;
use tokenguard_core::error::AppError;
use tokenguard_core::result::AppResult;
use tokenguard_core::traits::IdentityProvider;
use tokenguard_core::types::Identity;

use crate::authz::{CodeKind, CodeRequirement, Evaluator};
use crate::error::{AuthError, AuthResult};
use crate::keyring::{Keyring, SceneKeys};
use crate::signer::digest::md5_hex;
use crate::token::{REGISTERED_CLAIMS, Token};

use super::context::RequestContext;
use super::store::TokenStore;

/// Seconds added to blacklist and refresh hand-off entries.
pub const GRACE_SECONDS: u64 = 10;

/// Lifetime of the refresh lock.
pub const LOCK_TTL: Duration = Duration::from_secs(5);

/// Token to refresh.
#[derive(Debug, Clone, Default)]
pub enum TokenInput<'a> {
    /// Resolve the token from the request context.
    #[default]
    Request,
    /// A token string, with or without the `Bearer ` prefix.
    Raw(&'a str),
    /// An already parsed token, typically from [`AuthError::TokenExpired`].
    Token(Token),
}

impl<'a> From<&'a str> for TokenInput<'a> {
    fn from(raw: &'a str) -> Self {
        Self::Raw(raw)
    }
}

impl From<Token> for TokenInput<'_> {
    fn from(token: Token) -> Self {
        Self::Token(token)
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Manages the token lifecycle of a single scene.
///
/// Token states move from fresh to expired-but-refreshable to terminal.
/// Terminal and blacklisted states are absorbing.
#[derive(Clone)]
pub struct SessionManager {
    /// Scene name.
    scene: String,
    /// Scene settings.
    config: SceneConfig,
    /// Signing material of this scene.
    keys: Arc<SceneKeys>,
    /// Signing material of every scene, used to parse foreign tokens.
    keyring: Arc<Keyring>,
    /// Blacklist, snapshots and locks.
    store: TokenStore,
    /// Identity lookups for stateless scenes.
    identities: Option<Arc<dyn IdentityProvider>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("scene", &self.scene)
            .field("ttl", &self.config.ttl)
            .field("refresh_ttl", &self.config.refresh_ttl)
            .field("single", &self.config.single)
            .field("stateful", &self.config.stateful)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates the session manager of `scene`. The keyring must contain the
    /// scene.
    pub fn new(
        scene: &str,
        config: SceneConfig,
        keyring: Arc<Keyring>,
        store: TokenStore,
        identities: Option<Arc<dyn IdentityProvider>>,
    ) -> AppResult<Self> {
        config.validate(scene)?;
        let keys = keyring.scene(scene).cloned().ok_or_else(|| {
            AppError::configuration(format!("Scene '{scene}' has no signing keys"))
        })?;

        Ok(Self {
            scene: scene.to_string(),
            config,
            keys,
            keyring,
            store,
            identities,
        })
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Seconds until the token leaves its refresh window, clamped at zero.
    fn refreshable_for(&self, token: &Token) -> u64 {
        let deadline = token
            .expires_at()
            .unwrap_or(0)
            .saturating_add(self.config.refresh_ttl as i64);
        (deadline - now()).max(0) as u64
    }

    /// Blacklist entries outlive the refresh window of the token by the grace
    /// period; past that point the token is rejected anyway.
    fn blacklist_ttl(&self, token: &Token) -> Duration {
        Duration::from_secs(self.refreshable_for(token) + GRACE_SECONDS)
    }

    /// Issues a token for `identity`.
    ///
    /// Custom claims are appended after `sub`, `iat`, `exp` and `iss`; a custom
    /// claim can not override one of those. In stateful scenes the identity
    /// snapshot is cached for `ttl + refresh_ttl`.
    pub async fn issue(
        &self,
        ctx: &RequestContext,
        identity: &Identity,
        claims: Map<String, Value>,
    ) -> AuthResult<Token> {
        let issued_at = now();
        let mut token = Token::new(self.scene.as_str());
        token
            .set_header("alg", self.keys.default_signer().algorithm().as_str())
            .set_header("age", self.keys.fingerprint(ctx.user_agent()));
        token
            .set_claim("sub", identity.id.as_str())
            .set_claim("iat", issued_at)
            .set_claim("exp", issued_at.saturating_add(self.config.ttl as i64))
            .set_claim("iss", ctx.host());
        for (name, value) in claims {
            if !REGISTERED_CLAIMS.contains(&name.as_str()) {
                token.set_claim(name, value);
            }
        }
        token.ensure_id(self.keys.secret());

        if self.config.stateful {
            let ttl = Duration::from_secs(self.config.ttl + self.config.refresh_ttl);
            self.store
                .put_session(&self.scene, &identity.id, identity, ttl)
                .await?;
        }

        info!(
            scene = %self.scene,
            sub = %identity.id,
            jti = token.id().unwrap_or_default(),
            "Token issued"
        );
        Ok(token)
    }

    /// Encodes a token with this scene's default signer.
    pub fn encode(&self, token: &mut Token) -> AuthResult<String> {
        token.encode(&self.keys)
    }

    /// Issues and encodes a token, and stores it in the login slot of the
    /// request so that later checks in the same request see it.
    pub async fn login(
        &self,
        ctx: &mut RequestContext,
        identity: &Identity,
        claims: Map<String, Value>,
    ) -> AuthResult<String> {
        let mut token = self.issue(ctx, identity, claims).await?;
        let encoded = self.encode(&mut token)?;
        ctx.set_login_token(encoded.clone());
        Ok(encoded)
    }

    /// Validates the token of the request.
    ///
    /// Checks, in order:
    /// 1. A token is present (explicit argument, refresh slot, login slot,
    ///    header, `token` query parameter)
    /// 2. Format and signature
    /// 3. The token belongs to this scene
    /// 4. The token id is not blacklisted
    /// 5. Single-device scenes: the device fingerprint matches
    /// 6. The token has not expired (`TokenExpired` carries the token)
    /// 7. Stateful scenes: the session snapshot still exists
    pub async fn validate(&self, ctx: &RequestContext, token: Option<&str>) -> AuthResult<Token> {
        let raw = ctx.bearer(token).ok_or(AuthError::AuthRequired)?;
        let token = Token::parse(raw, &self.keyring, true)?;
        self.verify_claims(ctx, token).await
    }

    /// Runs the post-parse checks of [`SessionManager::validate`].
    async fn verify_claims(&self, ctx: &RequestContext, token: Token) -> AuthResult<Token> {
        if token.scene() != self.scene {
            return Err(AuthError::invalid(format!(
                "token was issued for scene '{}'",
                token.scene()
            )));
        }

        let jti = token
            .id()
            .ok_or_else(|| AuthError::invalid("missing token id"))?;
        if self.store.is_blacklisted(jti).await? {
            debug!(scene = %self.scene, jti, "Rejected blacklisted token");
            return Err(AuthError::Blacklisted);
        }

        if self.config.single {
            let expected = self.keys.fingerprint(ctx.user_agent());
            if token.fingerprint() != Some(expected.as_str()) {
                warn!(scene = %self.scene, "Token presented from a different environment");
                return Err(AuthError::EnvironmentMismatch);
            }
        }

        let subject = token
            .subject()
            .ok_or_else(|| AuthError::invalid("missing subject"))?;
        let expires_at = token
            .expires_at()
            .ok_or_else(|| AuthError::invalid("missing expiry"))?;
        if expires_at <= now() {
            return Err(AuthError::TokenExpired(Box::new(token)));
        }

        if self.config.stateful && !self.store.has_session(&self.scene, &subject).await? {
            debug!(scene = %self.scene, sub = %subject, "Session evicted");
            return Err(AuthError::Blacklisted);
        }

        Ok(token)
    }

    /// Parses the token named by `input`, checking its signature only.
    fn resolve(&self, ctx: &RequestContext, input: TokenInput<'_>) -> AuthResult<Token> {
        let raw = match input {
            TokenInput::Token(token) => return Ok(token),
            TokenInput::Request => ctx.bearer(None),
            TokenInput::Raw(raw) => ctx.bearer(Some(raw)),
        };
        Token::parse(raw.ok_or(AuthError::AuthRequired)?, &self.keyring, true)
    }

    /// Runs the post-parse checks, accepting an expired token.
    async fn verify_allow_expired(&self, ctx: &RequestContext, token: Token) -> AuthResult<Token> {
        match self.verify_claims(ctx, token).await {
            Ok(token) => Ok(token),
            Err(AuthError::TokenExpired(token)) => Ok(*token),
            Err(e) => Err(e),
        }
    }

    /// Validates, accepting an expired token.
    async fn validate_allow_expired(
        &self,
        ctx: &RequestContext,
        input: TokenInput<'_>,
    ) -> AuthResult<Token> {
        let token = self.resolve(ctx, input)?;
        self.verify_allow_expired(ctx, token).await
    }

    /// Refreshes a token and returns the new token string.
    ///
    /// 1. For [`TokenInput::Request`], return the token already minted in
    ///    this request, if any
    /// 2. Validate, accepting an expired token. A token blacklisted by a
    ///    concurrent refresh yields the token that replaced it
    /// 3. Unless `force`, reject tokens past their refresh window
    /// 4. Load the identity to reissue for
    /// 5. Take the refresh lock keyed by the payload digest and reissue;
    ///    requests that lose the race return the winner's token
    ///
    /// The lock is retried with 100-200 ms of jitter plus `retry_time` until
    /// `retry * retry_time` has elapsed, with at least one attempt.
    pub async fn refresh(
        &self,
        ctx: &mut RequestContext,
        input: TokenInput<'_>,
        force: bool,
    ) -> AuthResult<String> {
        // Step 1: Already refreshed in this request
        if let (TokenInput::Request, Some(minted)) = (&input, ctx.refresh_token()) {
            return Ok(minted.to_string());
        }

        // Step 2: Recover the token
        let parsed = self.resolve(ctx, input)?;
        let presented_jti = parsed.id().map(str::to_string);
        let token = match self.verify_allow_expired(ctx, parsed).await {
            Ok(token) => token,
            Err(AuthError::Blacklisted) => {
                let replaced = match presented_jti.as_deref() {
                    Some(jti) => self.store.handoff(jti).await?,
                    None => None,
                };
                let Some(minted) = replaced else {
                    return Err(AuthError::Blacklisted);
                };
                debug!(
                    scene = %self.scene,
                    jti = presented_jti.as_deref().unwrap_or_default(),
                    "Token was replaced by a concurrent refresh"
                );
                ctx.set_refresh_token(minted.clone());
                return Ok(minted);
            }
            Err(e) => return Err(e),
        };
        let subject = token
            .subject()
            .ok_or_else(|| AuthError::invalid("missing subject"))?;
        let jti = token.id().unwrap_or_default().to_string();

        // Step 3: Refresh window
        let deadline = token
            .expires_at()
            .unwrap_or(0)
            .saturating_add(self.config.refresh_ttl as i64);
        if !force && now() > deadline {
            if self.config.stateful {
                self.store.evict_session(&self.scene, &subject).await?;
            }
            info!(scene = %self.scene, sub = %subject, jti = %jti, "Refresh window elapsed");
            return Err(AuthError::RefreshWindowElapsed);
        }

        // Step 4: Identity
        let identity = self.identity(&token).await?;

        // Step 5: Locked reissue
        let lock = md5_hex(Value::Object(token.payload().clone()).to_string());
        let retry_delay = Duration::from_secs(self.config.retry_time);
        let budget = retry_delay * self.config.retry;
        let started = Instant::now();

        loop {
            if let Some(minted) = self.store.handoff(&jti).await? {
                debug!(scene = %self.scene, jti = %jti, "Token already refreshed by a concurrent request");
                ctx.set_refresh_token(minted.clone());
                return Ok(minted);
            }

            if let Some(owner) = self.store.acquire_lock(&lock, LOCK_TTL).await? {
                let outcome = self.reissue(ctx, &token, &identity).await;
                if let Err(e) = self.store.release_lock(&lock, &owner).await {
                    warn!(scene = %self.scene, error = %e, "Failed to release refresh lock");
                }
                return outcome;
            }

            if started.elapsed() >= budget {
                break;
            }
            let jitter = rand::thread_rng().gen_range(100..=200);
            debug!(scene = %self.scene, jti = %jti, jitter_ms = jitter, "Refresh lock busy, retrying");
            sleep(Duration::from_millis(jitter) + retry_delay).await;
        }

        warn!(scene = %self.scene, sub = %subject, jti = %jti, "Timed out waiting for refresh lock");
        Err(AuthError::RefreshLockTimeout)
    }

    /// Critical section of [`SessionManager::refresh`]. Runs with the lock held.
    async fn reissue(
        &self,
        ctx: &mut RequestContext,
        old: &Token,
        identity: &Identity,
    ) -> AuthResult<String> {
        let old_jti = old.id().unwrap_or_default();

        // The previous holder may have finished between our hand-off check
        // and lock acquisition.
        if let Some(minted) = self.store.handoff(old_jti).await? {
            ctx.set_refresh_token(minted.clone());
            return Ok(minted);
        }

        let mut token = self.issue(ctx, identity, old.custom_claims()).await?;
        let encoded = self.encode(&mut token)?;

        self.store
            .record_handoff(old_jti, &encoded, Duration::from_secs(GRACE_SECONDS))
            .await?;
        ctx.set_refresh_token(encoded.clone());

        // Identical content within the same second yields the same id.
        if token.id() != Some(old_jti) {
            self.store.blacklist(old_jti, self.blacklist_ttl(old)).await?;
        }

        info!(
            scene = %self.scene,
            sub = %identity.id,
            old_jti,
            new_jti = token.id().unwrap_or_default(),
            "Token refreshed"
        );
        Ok(encoded)
    }

    /// Logs out: evicts the session snapshot and blacklists the token.
    /// Expired tokens are accepted.
    pub async fn logout(&self, ctx: &RequestContext, token: Option<&str>) -> AuthResult<bool> {
        let input = token.map(TokenInput::Raw).unwrap_or_default();
        let token = self.validate_allow_expired(ctx, input).await?;
        let subject = token.subject().unwrap_or_default();

        if self.config.stateful {
            self.store.evict_session(&self.scene, &subject).await?;
        }
        if let Some(jti) = token.id() {
            self.store.blacklist(jti, self.blacklist_ttl(&token)).await?;
        }

        info!(scene = %self.scene, sub = %subject, "Logged out");
        Ok(true)
    }

    /// Evicts the session snapshot of `identity`, invalidating all of its
    /// tokens in this scene. Has no effect in stateless scenes.
    pub async fn force_exit(&self, identity: &Identity) -> AuthResult<bool> {
        if !self.config.stateful {
            warn!(scene = %self.scene, sub = %identity.id, "Forced exit ignored in stateless scene");
            return Ok(false);
        }
        self.store.evict_session(&self.scene, &identity.id).await?;
        info!(scene = %self.scene, sub = %identity.id, "Forced exit");
        Ok(true)
    }

    /// Blacklists a token by id alone for `refresh_ttl` plus the grace period.
    pub async fn revoke(&self, jti: &str) -> AuthResult<bool> {
        let ttl = Duration::from_secs(self.config.refresh_ttl + GRACE_SECONDS);
        self.store.blacklist(jti, ttl).await?;
        info!(scene = %self.scene, jti, "Token revoked");
        Ok(true)
    }

    /// Identity of a subject in a stateless scene. Code lists come from the
    /// provider's code accessors.
    async fn resolve_identity(&self, subject: &str) -> AuthResult<Identity> {
        let Some(provider) = &self.identities else {
            return Ok(Identity::new(subject));
        };
        let mut identity = provider
            .user_info(subject)
            .await?
            .unwrap_or_else(|| Identity::new(subject));
        identity.permission_codes = provider.permission_codes(subject).await?;
        identity.role_codes = provider.role_codes(subject).await?;
        identity.post_codes = provider.post_codes(subject).await?;
        Ok(identity)
    }

    /// Identity behind a validated token: the cached snapshot in stateful
    /// scenes (`Blacklisted` if evicted), otherwise the identity provider.
    pub async fn identity(&self, token: &Token) -> AuthResult<Identity> {
        let subject = token
            .subject()
            .ok_or_else(|| AuthError::invalid("missing subject"))?;
        if self.config.stateful {
            self.store
                .session(&self.scene, &subject)
                .await?
                .ok_or(AuthError::Blacklisted)
        } else {
            self.resolve_identity(&subject).await
        }
    }

    /// Identity of the authenticated subject.
    pub async fn current_user(&self, ctx: &RequestContext) -> AuthResult<Identity> {
        let token = self.validate(ctx, None).await?;
        self.identity(&token).await
    }

    /// Whether `identity` is the configured super administrator or the
    /// identity provider reports it as one.
    pub async fn is_super_admin_identity(&self, identity: &Identity) -> AuthResult<bool> {
        if self.config.super_admin.as_deref() == Some(identity.id.as_str()) {
            return Ok(true);
        }
        match &self.identities {
            Some(provider) => Ok(provider.is_super_admin(&identity.id).await?),
            None => Ok(false),
        }
    }

    /// Replaces the cached snapshot of the authenticated subject, keeping the
    /// remaining session lifetime. Returns `false` in stateless scenes or if
    /// `identity` is not the authenticated subject.
    pub async fn refresh_user(&self, ctx: &RequestContext, identity: &Identity) -> AuthResult<bool> {
        let token = self.validate(ctx, None).await?;
        if !self.config.stateful {
            return Ok(false);
        }
        let subject = token.subject().unwrap_or_default();
        if identity.id != subject {
            warn!(scene = %self.scene, sub = %subject, other = %identity.id, "Refusing to overwrite another subject's snapshot");
            return Ok(false);
        }
        let ttl = Duration::from_secs(self.refreshable_for(&token).max(1));
        self.store
            .put_session(&self.scene, &subject, identity, ttl)
            .await?;
        Ok(true)
    }

    /// Subject of the authenticated token.
    pub async fn id(&self, ctx: &RequestContext) -> AuthResult<String> {
        let token = self.validate(ctx, None).await?;
        token
            .subject()
            .ok_or_else(|| AuthError::invalid("missing subject"))
    }

    /// Validates without returning the token.
    pub async fn check(&self, ctx: &RequestContext) -> AuthResult<()> {
        self.validate(ctx, None).await.map(|_| ())
    }

    /// Whether the authenticated subject is a super administrator. Never
    /// fails: an invalid request or a provider error is not a super admin.
    pub async fn is_super_admin(&self, ctx: &RequestContext) -> bool {
        let Ok(token) = self.validate(ctx, None).await else {
            return false;
        };
        let Some(subject) = token.subject() else {
            return false;
        };
        self.is_super_admin_identity(&Identity::new(subject))
            .await
            .unwrap_or(false)
    }

    /// Parses the request token without checking its signature, expiry or
    /// revocation. For introspection only.
    pub fn peek(&self, ctx: &RequestContext, token: Option<&str>) -> AuthResult<Token> {
        let raw = ctx.bearer(token).ok_or(AuthError::AuthRequired)?;
        Token::parse(raw, &self.keyring, false)
    }

    /// Authenticates the request and evaluates a code requirement against
    /// the identity. Super administrators pass permission checks.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        kind: CodeKind,
        requirement: &CodeRequirement,
    ) -> AuthResult<Identity> {
        let identity = self.current_user(ctx).await?;
        let super_admin = self.is_super_admin_identity(&identity).await?;
        Evaluator::new(kind).check(requirement, kind.codes(&identity), super_admin)?;
        Ok(identity)
    }
}
