//! Code guards for handlers.
//!
//! Codes are comma-separated; [`JoinMode::Or`] requires any one of them,
//! [`JoinMode::And`] requires all. The super administrator bypasses
//! permission checks but not role or post checks.

use tokenguard_auth::{CodeKind, CodeRequirement, Evaluator};

pub use tokenguard_auth::JoinMode;

use crate::error::ApiError;
use crate::extractors::AuthUser;

/// Require permission codes.
pub fn require_permissions(auth: &AuthUser, codes: &str, mode: JoinMode) -> Result<(), ApiError> {
    require(CodeKind::Permission, auth, codes, mode)
}

/// Require role codes.
pub fn require_roles(auth: &AuthUser, codes: &str, mode: JoinMode) -> Result<(), ApiError> {
    require(CodeKind::Role, auth, codes, mode)
}

/// Require post codes.
pub fn require_posts(auth: &AuthUser, codes: &str, mode: JoinMode) -> Result<(), ApiError> {
    require(CodeKind::Post, auth, codes, mode)
}

fn require(kind: CodeKind, auth: &AuthUser, codes: &str, mode: JoinMode) -> Result<(), ApiError> {
    let requirement = CodeRequirement::parse(codes, mode);
    Evaluator::new(kind)
        .check(&requirement, kind.codes(&auth.identity), auth.super_admin)
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokenguard_auth::Token;
    use tokenguard_core::types::Identity;

    fn user(identity: Identity, super_admin: bool) -> AuthUser {
        AuthUser {
            scene: "admin".into(),
            identity,
            token: Token::new("admin"),
            super_admin,
        }
    }

    #[test]
    fn test_permission_modes() {
        let auth = user(Identity::new("7").with_permissions(["user:list"]), false);
        assert!(require_permissions(&auth, "user:list,user:delete", JoinMode::Or).is_ok());
        assert!(require_permissions(&auth, "user:list,user:delete", JoinMode::And).is_err());
    }

    #[test]
    fn test_super_admin_bypasses_permissions_only() {
        let auth = user(Identity::new("1"), true);
        assert!(require_permissions(&auth, "anything", JoinMode::And).is_ok());
        assert!(require_roles(&auth, "admin", JoinMode::Or).is_err());
        assert!(require_posts(&auth, "ceo", JoinMode::Or).is_err());
    }
}
