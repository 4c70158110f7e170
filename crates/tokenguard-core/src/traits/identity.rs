//! Identity provider trait implemented by the application's user store.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::Identity;

/// Narrow lookup interface over the identity store.
///
/// Only `user_info` is required; the code accessors default to the lists
/// carried by the returned identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Loads the identity for a subject id, or `None` if it is unknown.
    async fn user_info(&self, id: &str) -> AppResult<Option<Identity>>;

    /// Permission codes of the subject.
    async fn permission_codes(&self, id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .user_info(id)
            .await?
            .map(|identity| identity.permission_codes)
            .unwrap_or_default())
    }

    /// Role codes of the subject.
    async fn role_codes(&self, id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .user_info(id)
            .await?
            .map(|identity| identity.role_codes)
            .unwrap_or_default())
    }

    /// Post codes of the subject.
    async fn post_codes(&self, id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .user_info(id)
            .await?
            .map(|identity| identity.post_codes)
            .unwrap_or_default())
    }

    /// Whether the subject is a super administrator.
    async fn is_super_admin(&self, _id: &str) -> AppResult<bool> {
        Ok(false)
    }
}

/// Identity provider backed by a fixed list, used by the bundled server
/// and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    identities: Vec<Identity>,
}

impl StaticIdentityProvider {
    /// Creates a provider over the given identities.
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn user_info(&self, id: &str) -> AppResult<Option<Identity>> {
        Ok(self.identities.iter().find(|i| i.id == id).cloned())
    }
}
