//! User directory
//!
//! Registered identities keyed by username. The directory is owned by the
//! `ChatServer` actor, so each call below runs as one uninterrupted step
//! and the uniqueness checks cannot race the insert.

use std::collections::HashMap;

use crate::error::{AuthError, ValidationError};
use crate::types::Identity;

/// Length of a valid mobile number
pub const MOBILE_DIGITS: usize = 10;

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, Identity>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new identity
    ///
    /// Input is checked again here even though the parser already did; the
    /// directory does not trust its callers.
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        mobile: &str,
    ) -> Result<(), AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::InvalidSignup.into());
        }
        if !is_valid_mobile(mobile) {
            return Err(ValidationError::InvalidMobile.into());
        }

        if self.users.contains_key(username) {
            return Err(AuthError::DuplicateUsername);
        }
        if self.users.values().any(|user| user.mobile == mobile) {
            return Err(AuthError::DuplicateMobile);
        }

        let identity = Identity::new(username, password, mobile);
        self.users.insert(username.to_string(), identity);
        Ok(())
    }

    /// Check a username/password pair
    pub fn authenticate(&self, username: &str, password: &str) -> Result<&Identity, AuthError> {
        let user = self.users.get(username).ok_or(AuthError::NotFound)?;
        if user.password != password {
            return Err(AuthError::WrongPassword);
        }
        Ok(user)
    }

    /// Number of registered identities
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Exactly ten ASCII decimal digits
pub fn is_valid_mobile(mobile: &str) -> bool {
    mobile.len() == MOBILE_DIGITS && mobile.bytes().all(|b| b.is_ascii_digit())
}
