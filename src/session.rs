//! Session struct definition
//!
//! One signed-in connection and the queue its writer task drains.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::protocol::ServerLine;
use crate::types::SessionId;

/// Outbound queue of one connection
///
/// Unbounded so that queueing a line never waits on the peer's socket.
pub type Outbound = mpsc::UnboundedSender<ServerLine>;

/// Signed-in client
#[derive(Debug, Clone)]
pub struct Session {
    /// Connection this session belongs to
    pub id: SessionId,
    /// Username bound at signin, never changed afterwards
    pub username: String,
    /// Server → Client line channel
    pub sender: Outbound,
}

impl Session {
    pub fn new(id: SessionId, username: impl Into<String>, sender: Outbound) -> Self {
        Self {
            id,
            username: username.into(),
            sender,
        }
    }

    /// Queue a line for this client
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub fn send(&self, line: ServerLine) -> Result<(), SendError> {
        self.sender
            .send(line)
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Check whether the writer side has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_send() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Session::new(SessionId::new(), "alice", tx);

        session.send(ServerLine::SigninOk).unwrap();
        assert_eq!(rx.recv().await, Some(ServerLine::SigninOk));
        assert!(!session.is_closed());
    }

    #[tokio::test]
    async fn test_session_send_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::new(SessionId::new(), "alice", tx);
        drop(rx);

        assert!(session.is_closed());
        assert!(matches!(
            session.send(ServerLine::SigninOk),
            Err(SendError::ChannelClosed)
        ));
    }
}
