//! Error types for the chat relay
//!
//! Rejections (`ValidationError`, `AuthError`) are answered on the wire and
//! keep the connection open; their `Display` text is the exact reply line.
//! Transport failures (`AppError`) end one connection. Uses thiserror for
//! ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Malformed or out-of-place client commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Wrong field count or an empty field in a SIGNUP line
    #[error("Invalid signup data.")]
    InvalidSignup,

    /// Wrong field count or an empty field in a SIGNIN line
    #[error("Invalid signin data.")]
    InvalidSignin,

    /// Mobile number is not exactly 10 decimal digits
    #[error("Mobile number must be exactly 10 digits.")]
    InvalidMobile,

    /// Chat or typing command before signin
    #[error("Please sign in first.")]
    NotSignedIn,

    /// SIGNIN on a connection that is already signed in
    #[error("Already signed in.")]
    AlreadySignedIn,
}

/// User directory failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Username already exists. Choose a different username.")]
    DuplicateUsername,

    #[error("Mobile number is already registered. Use a different number.")]
    DuplicateMobile,

    #[error("Account not found")]
    NotFound,

    #[error("Incorrect password. Please try again.")]
    WrongPassword,

    /// Input the directory refused before looking anything up
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Application-level errors
///
/// All of these are fatal to the connection they occur on and to nothing
/// else.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the socket
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (oversized line, invalid UTF-8, IO)
    #[error("Line codec error: {0}")]
    Codec(#[from] LinesCodecError),

    /// The server actor has shut down
    #[error("Server closed")]
    ServerClosed,
}

/// Message send errors
///
/// Occurs when attempting to send lines through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_wire_text() {
        assert_eq!(AuthError::NotFound.to_string(), "Account not found");
        assert_eq!(
            AuthError::WrongPassword.to_string(),
            "Incorrect password. Please try again."
        );
    }

    #[test]
    fn test_invalid_is_transparent() {
        let err: AuthError = ValidationError::InvalidMobile.into();
        assert_eq!(err.to_string(), "Mobile number must be exactly 10 digits.");
    }
}
