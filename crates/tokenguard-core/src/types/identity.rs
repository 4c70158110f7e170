//! Identity snapshot cached per scene and subject.

use serde::{Deserialize, Serialize};

/// A snapshot of an authenticated identity.
///
/// Issued tokens only carry the identity id; the code lists are cached
/// alongside the session so that refresh and authorization checks do not
/// need to query the identity store again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject id written to the `sub` claim.
    pub id: String,
    /// Operation permission codes.
    #[serde(default)]
    pub permission_codes: Vec<String>,
    /// Role codes.
    #[serde(default)]
    pub role_codes: Vec<String>,
    /// Post (position) codes.
    #[serde(default)]
    pub post_codes: Vec<String>,
    /// Arbitrary profile data returned by `current_user`.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub info: serde_json::Value,
}

impl Identity {
    /// Creates an identity with no codes attached.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the permission codes.
    pub fn with_permissions<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permission_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the role codes.
    pub fn with_roles<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the post codes.
    pub fn with_posts<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the profile data.
    pub fn with_info(mut self, info: serde_json::Value) -> Self {
        self.info = info;
        self
    }
}
