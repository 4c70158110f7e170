//! OR/AND evaluation of required codes against an identity's codes.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tokenguard_core::error::AppError;
use tokenguard_core::types::Identity;

use crate::error::{AuthError, AuthResult};

/// Which code list of an identity a requirement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    /// Operation permission codes.
    Permission,
    /// Role codes.
    Role,
    /// Post (position) codes.
    Post,
}

impl CodeKind {
    /// Human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::Role => "role",
            Self::Post => "post",
        }
    }

    /// The identity's codes of this kind.
    pub fn codes<'a>(&self, identity: &'a Identity) -> &'a [String] {
        match self {
            Self::Permission => &identity.permission_codes,
            Self::Role => &identity.role_codes,
            Self::Post => &identity.post_codes,
        }
    }
}

/// How the required codes combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinMode {
    /// At least one required code must be held.
    #[default]
    Or,
    /// Every required code must be held.
    And,
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or => f.write_str("OR"),
            Self::And => f.write_str("AND"),
        }
    }
}

impl FromStr for JoinMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OR" => Ok(Self::Or),
            "AND" => Ok(Self::And),
            other => Err(AppError::validation(format!(
                "Unknown join mode '{other}', expected OR or AND"
            ))),
        }
    }
}

/// A list of required codes and how they combine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeRequirement {
    codes: Vec<String>,
    mode: JoinMode,
}

impl CodeRequirement {
    /// Parses a comma-separated list. Whitespace is trimmed and empty
    /// entries are ignored.
    pub fn parse(codes: &str, mode: JoinMode) -> Self {
        Self::new(codes.split(','), mode)
    }

    pub fn new<I, S>(codes: I, mode: JoinMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self { codes, mode }
    }

    /// Any of the given codes.
    pub fn any<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(codes, JoinMode::Or)
    }

    /// All of the given codes.
    pub fn all<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(codes, JoinMode::And)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn mode(&self) -> JoinMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Evaluates requirements of one code kind.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    kind: CodeKind,
}

impl Evaluator {
    pub fn new(kind: CodeKind) -> Self {
        Self { kind }
    }

    pub fn permissions() -> Self {
        Self::new(CodeKind::Permission)
    }

    pub fn roles() -> Self {
        Self::new(CodeKind::Role)
    }

    pub fn posts() -> Self {
        Self::new(CodeKind::Post)
    }

    pub fn kind(&self) -> CodeKind {
        self.kind
    }

    /// Returns `Ok(())` if `actual` satisfies `required`, or
    /// `Err(AuthError::Forbidden)` naming the missing codes.
    ///
    /// An empty requirement always passes. `super_admin` only bypasses
    /// permission checks.
    pub fn check(
        &self,
        required: &CodeRequirement,
        actual: &[String],
        super_admin: bool,
    ) -> AuthResult<()> {
        if required.is_empty() {
            return Ok(());
        }
        if super_admin && self.kind == CodeKind::Permission {
            return Ok(());
        }

        let held: HashSet<&str> = actual.iter().map(String::as_str).collect();
        let missing: Vec<&str> = required
            .codes()
            .iter()
            .map(String::as_str)
            .filter(|code| !held.contains(code))
            .collect();

        let allowed = match required.mode() {
            JoinMode::Or => missing.len() < required.codes().len(),
            JoinMode::And => missing.is_empty(),
        };
        if allowed {
            return Ok(());
        }

        let quantifier = match required.mode() {
            JoinMode::Or => "any of",
            JoinMode::And => "all of",
        };
        Err(AuthError::Forbidden(format!(
            "requires {quantifier} {} codes [{}]; missing [{}]",
            self.kind.label(),
            required.codes().join(", "),
            missing.join(", ")
        )))
    }

    /// Boolean form of [`Evaluator::check`].
    pub fn allows(&self, required: &CodeRequirement, actual: &[String], super_admin: bool) -> bool {
        self.check(required, actual, super_admin).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_parse_trims_and_skips_empty() {
        let req = CodeRequirement::parse(" user:list , ,user:add,", JoinMode::And);
        assert_eq!(req.codes(), ["user:list", "user:add"]);
        assert!(CodeRequirement::parse(" , ", JoinMode::Or).is_empty());
    }

    #[test]
    fn test_empty_requirement_allows_anyone() {
        let req = CodeRequirement::parse("", JoinMode::And);
        assert!(Evaluator::roles().allows(&req, &[], false));
    }

    #[test]
    fn test_or_needs_one_match() {
        let eval = Evaluator::permissions();
        let req = CodeRequirement::any(["a", "b"]);
        assert!(eval.allows(&req, &codes(&["b"]), false));
        assert!(!eval.allows(&req, &codes(&["c"]), false));
    }

    #[test]
    fn test_and_needs_every_code() {
        let eval = Evaluator::permissions();
        let req = CodeRequirement::all(["a", "b"]);
        assert!(!eval.allows(&req, &codes(&["a"]), false));
        assert!(eval.allows(&req, &codes(&["a", "b", "c"]), false));
    }

    #[test]
    fn test_forbidden_message_names_missing_codes() {
        let err = Evaluator::roles()
            .check(&CodeRequirement::all(["admin", "auditor"]), &codes(&["admin"]), false)
            .unwrap_err();
        let AuthError::Forbidden(message) = err else {
            panic!("expected Forbidden");
        };
        assert_eq!(
            message,
            "requires all of role codes [admin, auditor]; missing [auditor]"
        );

        let err = Evaluator::posts()
            .check(&CodeRequirement::any(["ceo", "cto"]), &[], false)
            .unwrap_err();
        assert!(err.to_string().contains("any of post codes"));
    }

    #[test]
    fn test_super_admin_bypasses_permissions_only() {
        let req = CodeRequirement::all(["x"]);
        assert!(Evaluator::permissions().allows(&req, &[], true));
        assert!(!Evaluator::roles().allows(&req, &[], true));
        assert!(!Evaluator::posts().allows(&req, &[], true));
    }

    #[test]
    fn test_join_mode_from_str() {
        assert_eq!("and".parse::<JoinMode>().unwrap(), JoinMode::And);
        assert_eq!(" OR ".parse::<JoinMode>().unwrap(), JoinMode::Or);
        assert!("xor".parse::<JoinMode>().is_err());
    }
}
