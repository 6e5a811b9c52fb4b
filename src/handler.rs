//! Connection handler
//!
//! Owns one client from accept to disconnect: frames the stream into lines,
//! runs the signup/signin state machine, turns chat and typing commands into
//! broadcasts, and leaves the chat when the stream ends.

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{AppError, ValidationError};
use crate::protocol::{ClientCommand, ServerLine};
use crate::server::ServerHandle;
use crate::session::Outbound;
use crate::types::SessionId;

/// Per-connection limits
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    /// Longest accepted input line; a longer one closes the connection
    pub max_line_length: usize,
    /// Idle time after TYPING before the indicator is cleared for the
    /// client
    pub typing_timeout: Option<Duration>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for HandlerSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_line_length: config.max_line_length,
            typing_timeout: config.typing_timeout(),
        }
    }
}

/// Where a connection is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No identity yet
    Connected,
    /// Signed in and registered for broadcasts
    Authenticated { username: String },
    /// Torn down
    Closed,
}

/// Handle a new connection
///
/// Splits the stream into a reader (this task) and a writer task that
/// drains the connection's outbound queue. Whichever side ends first ends
/// the connection; the session then leaves the chat. A command already
/// being handled always runs to completion first, so a signin the server
/// accepted is always followed by a leave.
pub async fn handle_connection<S>(
    stream: S,
    server: ServerHandle,
    settings: HandlerSettings,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let session_id = SessionId::new();
    debug!("Connection {} opened", session_id);

    let framed = Framed::new(stream, LinesCodec::new_with_max_length(settings.max_line_length));
    let (mut sink, mut lines) = framed.split();

    // Server -> client queue, shared with the registry after signin
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerLine>();

    let mut write_task = tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            if let Err(e) = sink.send(line.to_string()).await {
                debug!("Write failed, ending write task: {}", e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut conn = Connection::new(session_id, server, out_tx, settings.typing_timeout);

    let result = conn.read_loop(&mut lines, &mut write_task).await;

    conn.close().await;
    drop(conn);

    // Everything queued before the leave has been handed to the writer;
    // give it a moment to flush, then drop the socket regardless.
    if !write_task.is_finished()
        && tokio::time::timeout(WRITER_GRACE, &mut write_task)
            .await
            .is_err()
    {
        debug!("Write task for {} did not finish, aborting", session_id);
        write_task.abort();
    }

    info!("Connection {} closed", session_id);
    result
}

const WRITER_GRACE: Duration = Duration::from_secs(1);

/// State owned by one connection's reader
struct Connection {
    session_id: SessionId,
    server: ServerHandle,
    outbound: Outbound,
    state: ConnectionState,
    typing_timeout: Option<Duration>,
    /// Set while the client is typing and a timeout is configured
    typing_deadline: Option<Instant>,
    is_typing: bool,
}

impl Connection {
    fn new(
        session_id: SessionId,
        server: ServerHandle,
        outbound: Outbound,
        typing_timeout: Option<Duration>,
    ) -> Self {
        Self {
            session_id,
            server,
            outbound,
            state: ConnectionState::Connected,
            typing_timeout,
            typing_deadline: None,
            is_typing: false,
        }
    }

    /// Read and dispatch lines until end of stream, a transport error, or
    /// the writer task ending
    ///
    /// The writer is only watched between commands; `handle_line` is never
    /// cancelled halfway.
    async fn read_loop<L>(
        &mut self,
        lines: &mut L,
        writer: &mut JoinHandle<()>,
    ) -> Result<(), AppError>
    where
        L: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    {
        loop {
            let deadline = self.typing_deadline;
            tokio::select! {
                next = lines.next() => match next {
                    Some(Ok(line)) => self.handle_line(&line).await?,
                    Some(Err(e)) => {
                        warn!("Read error on {}: {}", self.session_id, e);
                        return Err(e.into());
                    }
                    None => {
                        debug!("Client {} closed the stream", self.session_id);
                        return Ok(());
                    }
                },
                _ = typing_expired(deadline) => self.stop_typing().await?,
                _ = &mut *writer => {
                    debug!("Write task completed for {}", self.session_id);
                    return Ok(());
                }
            }
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<(), AppError> {
        if line.is_empty() {
            return Ok(());
        }

        let cmd = match ClientCommand::parse(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("Rejected line from {}: {}", self.session_id, e);
                self.reply(ServerLine::rejected(e));
                return Ok(());
            }
        };

        let username = match &self.state {
            ConnectionState::Authenticated { username } => Some(username.clone()),
            _ => None,
        };

        match (cmd, username) {
            (ClientCommand::Signup { username, password, mobile }, _) => {
                match self.server.signup(&username, &password, &mobile).await? {
                    Ok(()) => self.reply(ServerLine::SignupOk),
                    Err(e) => self.reply(ServerLine::rejected(e)),
                }
            }
            (ClientCommand::Signin { .. }, Some(_)) => {
                self.reply(ServerLine::rejected(ValidationError::AlreadySignedIn));
            }
            (ClientCommand::Signin { username, password }, None) => {
                let result = self
                    .server
                    .signin(self.session_id, &username, &password, self.outbound.clone())
                    .await?;
                match result {
                    // The actor already queued the success reply
                    Ok(()) => self.state = ConnectionState::Authenticated { username },
                    Err(e) => self.reply(ServerLine::rejected(e)),
                }
            }
            (_, None) => {
                self.reply(ServerLine::rejected(ValidationError::NotSignedIn));
            }
            (ClientCommand::Typing, Some(username)) => {
                self.is_typing = true;
                self.typing_deadline = self.typing_timeout.map(|t| Instant::now() + t);
                self.broadcast(ServerLine::Typing { username }).await?;
            }
            (ClientCommand::StopTyping, Some(_)) => self.stop_typing().await?,
            (ClientCommand::Chat { content }, Some(from)) => {
                self.broadcast(ServerLine::Chat { from, content }).await?;
            }
        }
        Ok(())
    }

    async fn stop_typing(&mut self) -> Result<(), AppError> {
        self.is_typing = false;
        self.typing_deadline = None;
        self.broadcast(ServerLine::ClearTyping).await
    }

    /// Broadcast to everyone but this connection
    async fn broadcast(&self, line: ServerLine) -> Result<(), AppError> {
        self.server.broadcast(line, Some(self.session_id)).await
    }

    fn reply(&self, line: ServerLine) {
        if self.outbound.send(line).is_err() {
            debug!("Reply to {} dropped, writer is gone", self.session_id);
        }
    }

    /// Leave the chat if signed in
    ///
    /// Safe to call more than once; only the first call after signin does
    /// anything.
    async fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnectionState::Closed);
        let ConnectionState::Authenticated { username } = state else {
            return;
        };

        if self.is_typing {
            self.is_typing = false;
            if let Err(e) = self.broadcast(ServerLine::ClearTyping).await {
                warn!("Could not clear typing indicator for {}: {}", username, e);
            }
        }

        match self.server.leave(self.session_id).await {
            Ok(true) => info!("{} left the chat", username),
            Ok(false) => warn!("{} was not registered at teardown", username),
            Err(e) => warn!("Could not deregister {}: {}", username, e),
        }
    }
}

async fn typing_expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
