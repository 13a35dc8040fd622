//! Scoring scope: the population of tasks and risks a score is computed over.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::framework::Framework;

/// Maximum accepted length for a user identifier.
const MAX_USER_ID_LEN: usize = 255;

/// Error constructing a [`UserId`] or [`Scope`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// The user identifier was empty or whitespace-only.
    #[error("userId must not be empty")]
    EmptyUserId,

    /// The user identifier exceeded the length limit.
    #[error("userId must not exceed {MAX_USER_ID_LEN} characters (got {0})")]
    UserIdTooLong(usize),
}

/// Validated opaque user identifier.
///
/// Serializes as a plain string. Validated on construction: non-empty after
/// trimming, at most 255 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a validated user identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ScopeError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ScopeError::EmptyUserId);
        }
        if trimmed.len() > MAX_USER_ID_LEN {
            return Err(ScopeError::UserIdTooLong(trimmed.len()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scoring scope: one user, optionally narrowed to a single framework.
///
/// `framework = None` means the score aggregates across all frameworks the
/// user tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Owner of the tasks and risks being scored.
    pub user_id: UserId,
    /// Optional framework narrowing.
    pub framework: Option<Framework>,
}

impl Scope {
    /// Create a scope from a validated user id and optional framework.
    pub fn new(user_id: UserId, framework: Option<Framework>) -> Self {
        Self { user_id, framework }
    }

    /// Whether the given record coordinates fall inside this scope.
    ///
    /// A record matches when its user id equals the scope's and, if the
    /// scope is framework-narrowed, its framework matches too.
    pub fn contains(&self, user_id: &UserId, framework: Option<Framework>) -> bool {
        if &self.user_id != user_id {
            return false;
        }
        match self.framework {
            None => true,
            Some(f) => framework == Some(f),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.framework {
            Some(fw) => write!(f, "{}/{fw}", self.user_id),
            None => write!(f, "{}/*", self.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty() {
        assert_eq!(UserId::new(""), Err(ScopeError::EmptyUserId));
        assert_eq!(UserId::new("   "), Err(ScopeError::EmptyUserId));
    }

    #[test]
    fn user_id_trims_whitespace() {
        let id = UserId::new("  user-1  ").unwrap();
        assert_eq!(id.as_str(), "user-1");
    }

    #[test]
    fn user_id_rejects_overlong() {
        let long = "x".repeat(256);
        assert!(matches!(
            UserId::new(long),
            Err(ScopeError::UserIdTooLong(256))
        ));
    }

    #[test]
    fn scope_contains_matches_user_and_framework() {
        let user = UserId::new("u1").unwrap();
        let other = UserId::new("u2").unwrap();
        let scope = Scope::new(user.clone(), Some(Framework::Soc2));

        assert!(scope.contains(&user, Some(Framework::Soc2)));
        assert!(!scope.contains(&user, Some(Framework::Gdpr)));
        assert!(!scope.contains(&user, None));
        assert!(!scope.contains(&other, Some(Framework::Soc2)));
    }

    #[test]
    fn unnarrowed_scope_contains_any_framework() {
        let user = UserId::new("u1").unwrap();
        let scope = Scope::new(user.clone(), None);

        assert!(scope.contains(&user, None));
        assert!(scope.contains(&user, Some(Framework::Hipaa)));
    }

    #[test]
    fn scope_display_shows_narrowing() {
        let user = UserId::new("u1").unwrap();
        assert_eq!(
            Scope::new(user.clone(), Some(Framework::Soc2)).to_string(),
            "u1/soc2"
        );
        assert_eq!(Scope::new(user, None).to_string(), "u1/*");
    }
}
