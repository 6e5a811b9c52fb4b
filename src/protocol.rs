//! Line protocol definitions
//!
//! Every frame is one newline-terminated UTF-8 line. Client lines are
//! colon-separated with the command token first; anything that is not a
//! known token is a chat message. Server lines carry no prefix and the
//! client tells them apart by content.

use std::fmt;

use crate::error::ValidationError;

const SIGNUP: &str = "SIGNUP";
const SIGNIN: &str = "SIGNIN";
const TYPING: &str = "TYPING";
const STOP_TYPING: &str = "STOP_TYPING";

/// Client → Server command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `SIGNUP:<username>:<password>:<mobile>`
    Signup {
        username: String,
        password: String,
        mobile: String,
    },
    /// `SIGNIN:<username>:<password>`
    Signin { username: String, password: String },
    /// `TYPING`
    Typing,
    /// `STOP_TYPING`
    StopTyping,
    /// Any other text, sent verbatim
    Chat { content: String },
}

impl ClientCommand {
    /// Classify one input line
    ///
    /// Only the first colon-separated field selects the command. SIGNUP and
    /// SIGNIN need at least their field count with none of those fields
    /// empty; anything after them is ignored.
    pub fn parse(line: &str) -> Result<Self, ValidationError> {
        let fields: Vec<&str> = line.split(':').collect();

        match fields[0] {
            SIGNUP => match fields.as_slice() {
                [_, username, password, mobile, ..]
                    if no_empty(&[username, password, mobile]) =>
                {
                    Ok(ClientCommand::Signup {
                        username: username.to_string(),
                        password: password.to_string(),
                        mobile: mobile.to_string(),
                    })
                }
                _ => Err(ValidationError::InvalidSignup),
            },
            SIGNIN => match fields.as_slice() {
                [_, username, password, ..] if no_empty(&[username, password]) => {
                    Ok(ClientCommand::Signin {
                        username: username.to_string(),
                        password: password.to_string(),
                    })
                }
                _ => Err(ValidationError::InvalidSignin),
            },
            TYPING => Ok(ClientCommand::Typing),
            STOP_TYPING => Ok(ClientCommand::StopTyping),
            _ => Ok(ClientCommand::Chat {
                content: line.to_string(),
            }),
        }
    }

    /// True for the commands allowed before signin
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ClientCommand::Signup { .. } | ClientCommand::Signin { .. }
        )
    }
}

fn no_empty(fields: &[&&str]) -> bool {
    fields.iter().all(|f| !f.is_empty())
}

/// Server → Client line
///
/// `Display` renders the exact wire text, without the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Signup accepted
    SignupOk,
    /// Signin accepted, the connection has joined
    SigninOk,
    /// Human-readable rejection of a command
    Rejected { reason: String },
    /// Someone started typing
    Typing { username: String },
    /// Clears the typing indicator (empty line)
    ClearTyping,
    /// Chat message from another user
    Chat { from: String, content: String },
    /// Someone joined
    Joined { username: String },
    /// Someone left
    Left { username: String },
}

impl ServerLine {
    pub fn rejected(reason: impl fmt::Display) -> Self {
        ServerLine::Rejected {
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerLine::SignupOk => {
                f.write_str("Signup successful. Please sign in to join the chat.")
            }
            ServerLine::SigninOk => f.write_str("Signin successful"),
            ServerLine::Rejected { reason } => f.write_str(reason),
            ServerLine::Typing { username } => write!(f, "{} is typing...", username),
            ServerLine::ClearTyping => Ok(()),
            ServerLine::Chat { from, content } => write!(f, "{}: {}", from, content),
            ServerLine::Joined { username } => write!(f, "{} has joined the chat.", username),
            ServerLine::Left { username } => write!(f, "{} has left the chat.", username),
        }
    }
}
