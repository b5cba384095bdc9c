//! Actors, roles and the identity provider boundary.
//!
//! The core never authenticates anyone. An opaque token is resolved by an
//! [`IdentityProvider`] into an [`Actor`]: a user ID plus a role.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use docflow_shared::ErrorKind;
use docflow_shared::types::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role in the organization hierarchy.
///
/// Roles are ordered from lowest to highest privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates and submits own documents.
    Employee = 0,
    /// Approves, rejects, completes and cancels documents.
    Manager = 1,
    /// Full access.
    Admin = 2,
}

impl Role {
    /// Parse a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Returns true if this role is at least `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// User ID.
    pub id: UserId,
    /// Role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Creates an employee with a fresh ID.
    #[must_use]
    pub fn employee() -> Self {
        Self::new(UserId::new(), Role::Employee)
    }

    /// Creates a manager with a fresh ID.
    #[must_use]
    pub fn manager() -> Self {
        Self::new(UserId::new(), Role::Manager)
    }

    /// Creates an admin with a fresh ID.
    #[must_use]
    pub fn admin() -> Self {
        Self::new(UserId::new(), Role::Admin)
    }

    /// Returns true if the actor is a manager or an admin.
    #[must_use]
    pub fn is_manager_or_admin(&self) -> bool {
        self.role.satisfies(Role::Manager)
    }
}

/// Opaque credential resolved by the identity provider.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorToken(String);

impl ActorToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ActorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActorToken(***)")
    }
}

/// Errors raised while resolving a token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is unknown or expired.
    #[error("Unknown or expired token")]
    UnknownToken,

    /// The provider could not be reached.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownToken => ErrorKind::Authorization,
            Self::Unavailable(_) => ErrorKind::Store,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownToken => "INVALID_TOKEN",
            Self::Unavailable(_) => "IDENTITY_UNAVAILABLE",
        }
    }
}

/// Resolves tokens into actors. Pure lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a token.
    async fn resolve(&self, token: &ActorToken) -> Result<Actor, IdentityError>;
}

/// Identity provider backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    actors: HashMap<ActorToken, Actor>,
}

impl StaticIdentityProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token.
    #[must_use]
    pub fn with_actor(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.actors.insert(ActorToken::new(token), actor);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &ActorToken) -> Result<Actor, IdentityError> {
        self.actors
            .get(token)
            .copied()
            .ok_or(IdentityError::UnknownToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("employee"), Some(Role::Employee));
        assert_eq!(Role::parse("MANAGER"), Some(Role::Manager));
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Employee < Role::Manager);
        assert!(Role::Manager < Role::Admin);
        assert!(Role::Admin.satisfies(Role::Manager));
        assert!(!Role::Employee.satisfies(Role::Manager));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = ActorToken::new("secret-token");
        assert_eq!(format!("{token:?}"), "ActorToken(***)");
        assert_eq!(token.as_str(), "secret-token");
    }

    #[tokio::test]
    async fn test_static_provider() {
        let manager = Actor::manager();
        let provider = StaticIdentityProvider::new().with_actor("m-1", manager);

        let resolved = provider.resolve(&ActorToken::new("m-1")).await.unwrap();
        assert_eq!(resolved, manager);

        let err = provider.resolve(&ActorToken::new("nope")).await.unwrap_err();
        assert!(matches!(err, IdentityError::UnknownToken));
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }
}
