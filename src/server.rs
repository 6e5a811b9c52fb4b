//! ChatServer Actor implementation
//!
//! The central actor that owns the user directory and the session registry.
//! Connection handlers never touch either directly; they send commands over
//! an mpsc channel and the actor applies them one at a time, which makes
//! every check-then-act sequence atomic.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::directory::UserDirectory;
use crate::error::{AppError, AuthError, ValidationError};
use crate::protocol::ServerLine;
use crate::registry::SessionRegistry;
use crate::session::{Outbound, Session};
use crate::types::SessionId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Register a new identity
    Signup {
        username: String,
        password: String,
        mobile: String,
        reply: oneshot::Sender<Result<(), AuthError>>,
    },
    /// Authenticate, register the session and announce it
    Signin {
        session_id: SessionId,
        username: String,
        password: String,
        sender: Outbound,
        reply: oneshot::Sender<Result<(), AuthError>>,
    },
    /// Fan a line out to every session except `exclude`
    Broadcast {
        line: ServerLine,
        exclude: Option<SessionId>,
    },
    /// Deregister a session and announce the departure
    Leave {
        session_id: SessionId,
        reply: oneshot::Sender<bool>,
    },
    /// Number of signed-in sessions
    SessionCount { reply: oneshot::Sender<usize> },
}

/// The main ChatServer actor
///
/// Processes commands from connection handlers until every handle is
/// dropped.
pub struct ChatServer {
    /// Registered identities
    directory: UserDirectory,
    /// Signed-in sessions
    sessions: SessionRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            directory: UserDirectory::new(),
            sessions: SessionRegistry::new(),
            receiver,
        }
    }

    /// Spawn the actor on the current runtime and return a handle to it
    pub fn start(buffer: usize) -> ServerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(buffer);
        tokio::spawn(ChatServer::new(cmd_rx).run());
        ServerHandle::new(cmd_tx)
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    ///
    /// Never awaits: sends to sessions go into unbounded queues, so a slow
    /// client cannot hold up the actor.
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Signup {
                username,
                password,
                mobile,
                reply,
            } => {
                let result = self.handle_signup(&username, &password, &mobile);
                let _ = reply.send(result);
            }
            ServerCommand::Signin {
                session_id,
                username,
                password,
                sender,
                reply,
            } => {
                let result = self.handle_signin(session_id, &username, &password, sender);
                let _ = reply.send(result);
            }
            ServerCommand::Broadcast { line, exclude } => {
                self.sessions.broadcast(&line, exclude);
            }
            ServerCommand::Leave { session_id, reply } => {
                let announced = self.handle_leave(session_id);
                let _ = reply.send(announced);
            }
            ServerCommand::SessionCount { reply } => {
                let _ = reply.send(self.sessions.len());
            }
        }
    }

    /// Handle signup
    fn handle_signup(
        &mut self,
        username: &str,
        password: &str,
        mobile: &str,
    ) -> Result<(), AuthError> {
        match self.directory.register(username, password, mobile) {
            Ok(()) => {
                info!("Signup successful: {} registered", username);
                debug!("Total identities: {}", self.directory.len());
                Ok(())
            }
            Err(e) => {
                warn!("Signup failed for {}: {}", username, e);
                Err(e)
            }
        }
    }

    /// Handle signin
    ///
    /// The success reply is queued before the session joins the registry so
    /// the client always sees it ahead of any broadcast.
    fn handle_signin(
        &mut self,
        session_id: SessionId,
        username: &str,
        password: &str,
        sender: Outbound,
    ) -> Result<(), AuthError> {
        if self.sessions.contains(session_id) {
            return Err(ValidationError::AlreadySignedIn.into());
        }

        if let Err(e) = self.directory.authenticate(username, password) {
            warn!("Signin failed for {}: {}", username, e);
            return Err(e);
        }

        let session = Session::new(session_id, username, sender);
        if session.send(ServerLine::SigninOk).is_err() {
            debug!("Session {} closed before signin reply", session_id);
        }
        self.sessions.add(session);

        info!("Signin successful: {} ({})", username, session_id);
        self.sessions.broadcast(
            &ServerLine::Joined {
                username: username.to_string(),
            },
            Some(session_id),
        );
        Ok(())
    }

    /// Handle departure
    ///
    /// Returns true if the session was registered, in which case exactly
    /// one departure notice went out.
    fn handle_leave(&mut self, session_id: SessionId) -> bool {
        let Some(session) = self.sessions.remove(session_id) else {
            return false;
        };

        info!("{} has disconnected", session.username);
        self.sessions.broadcast(
            &ServerLine::Left {
                username: session.username,
            },
            None,
        );
        info!("Current number of signed-in sessions: {}", self.sessions.len());
        true
    }
}

/// Cloneable front end to the ChatServer actor
#[derive(Debug, Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    pub fn new(sender: mpsc::Sender<ServerCommand>) -> Self {
        Self { sender }
    }

    async fn send(&self, cmd: ServerCommand) -> Result<(), AppError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| AppError::ServerClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ServerCommand,
    ) -> Result<T, AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx.await.map_err(|_| AppError::ServerClosed)
    }

    /// Register a new identity
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        mobile: &str,
    ) -> Result<Result<(), AuthError>, AppError> {
        self.request(|reply| ServerCommand::Signup {
            username: username.to_string(),
            password: password.to_string(),
            mobile: mobile.to_string(),
            reply,
        })
        .await
    }

    /// Authenticate and join with the given outbound queue
    pub async fn signin(
        &self,
        session_id: SessionId,
        username: &str,
        password: &str,
        sender: Outbound,
    ) -> Result<Result<(), AuthError>, AppError> {
        self.request(|reply| ServerCommand::Signin {
            session_id,
            username: username.to_string(),
            password: password.to_string(),
            sender,
            reply,
        })
        .await
    }

    /// Broadcast a line; returns once the actor has accepted the command
    pub async fn broadcast(
        &self,
        line: ServerLine,
        exclude: Option<SessionId>,
    ) -> Result<(), AppError> {
        self.send(ServerCommand::Broadcast { line, exclude }).await
    }

    /// Leave the chat; true if a departure notice was sent
    pub async fn leave(&self, session_id: SessionId) -> Result<bool, AppError> {
        self.request(|reply| ServerCommand::Leave { session_id, reply })
            .await
    }

    pub async fn session_count(&self) -> Result<usize, AppError> {
        self.request(|reply| ServerCommand::SessionCount { reply })
            .await
    }
}
