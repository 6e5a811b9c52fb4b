//! Multi-user Line-based Chat Relay Library
//!
//! Clients connect over TCP, sign up or sign in with colon-separated
//! commands, and then exchange chat lines and typing indicators that the
//! server relays to every other signed-in client.
//!
//! # Protocol
//! One UTF-8 line per frame:
//! - `SIGNUP:<username>:<password>:<mobile>`
//! - `SIGNIN:<username>:<password>`
//! - `TYPING` / `STOP_TYPING`
//! - anything else is a chat message
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the user directory and the
//!   session registry
//! - Each connection has a `handler` task that talks to the actor through
//!   a `ServerHandle` and a writer task draining its outbound queue
//! - No locks needed - all shared state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{serve, ChatServer, HandlerSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:12345").await.unwrap();
//!     let server = ChatServer::start(256);
//!     serve(listener, server, HandlerSettings::default()).await;
//! }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod handler;
pub mod listener;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use directory::UserDirectory;
pub use error::{AppError, AuthError, ConfigError, SendError, ValidationError};
pub use handler::{handle_connection, ConnectionState, HandlerSettings};
pub use listener::serve;
pub use protocol::{ClientCommand, ServerLine};
pub use registry::SessionRegistry;
pub use server::{ChatServer, ServerCommand, ServerHandle};
pub use session::Session;
pub use types::{Identity, SessionId};
