//! Basic type definitions for the chat relay
//!
//! - `SessionId`: UUID-based identifier for one live connection
//! - `Identity`: a registered user's credentials and contact number

use uuid::Uuid;

/// Unique connection identifier (newtype pattern)
///
/// Every accepted connection gets one, signed in or not. Sessions in the
/// registry are keyed by it, so two connections of the same user never
/// collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user
///
/// Created by a successful signup and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub password: String,
    pub mobile: String,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        mobile: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mobile: mobile.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_identity_new() {
        let identity = Identity::new("alice", "pw1", "1234567890");
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.password, "pw1");
        assert_eq!(identity.mobile, "1234567890");
    }
}
