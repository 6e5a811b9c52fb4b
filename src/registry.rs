//! Session registry and broadcast routing
//!
//! Holds every signed-in session. Like the directory it lives inside the
//! `ChatServer` actor, so membership changes and broadcast iteration never
//! interleave.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::protocol::ServerLine;
use crate::session::Session;
use crate::types::SessionId;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session
    ///
    /// Returns false and keeps the existing entry if the id is already
    /// registered.
    pub fn add(&mut self, session: Session) -> bool {
        if self.sessions.contains_key(&session.id) {
            warn!("Session {} is already registered", session.id);
            return false;
        }
        self.sessions.insert(session.id, session);
        true
    }

    /// Remove a session, returning it if it was present
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Send `line` to every session except `exclude`
    ///
    /// A closed queue is logged and skipped. It stays registered until its
    /// own handler leaves, which is what produces the departure notice.
    /// Returns the number of sessions the line was queued for.
    pub fn broadcast(&self, line: &ServerLine, exclude: Option<SessionId>) -> usize {
        let mut delivered = 0;

        for session in self.sessions.values() {
            if Some(session.id) == exclude {
                continue;
            }
            match session.send(line.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    "Broadcast to {} ({}) failed: {}",
                    session.username, session.id, e
                ),
            }
        }

        info!("Broadcast to {} session(s): {}", delivered, line);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn session(name: &str) -> (Session, mpsc::UnboundedReceiver<ServerLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(SessionId::new(), name, tx), rx)
    }

    fn chat(from: &str, content: &str) -> ServerLine {
        ServerLine::Chat {
            from: from.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut registry = SessionRegistry::new();
        let (alice, _rx) = session("alice");
        let id = alice.id;

        assert!(registry.add(alice));
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.username, "alice");
        assert!(registry.is_empty());

        // Second remove is a no-op
        assert!(registry.remove(id).is_none());
    }

    #[test]
    fn test_add_twice_keeps_first() {
        let mut registry = SessionRegistry::new();
        let (alice, _rx) = session("alice");
        let mut again = alice.clone();
        again.username = "mallory".to_string();

        assert!(registry.add(alice.clone()));
        assert!(!registry.add(again));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove(alice.id).unwrap().username, "alice");
    }

    #[test]
    fn test_broadcast_excludes_sender() {
        let mut registry = SessionRegistry::new();
        let (alice, mut alice_rx) = session("alice");
        let (bob, mut bob_rx) = session("bob");
        let (carol, mut carol_rx) = session("carol");
        let alice_id = alice.id;
        registry.add(alice);
        registry.add(bob);
        registry.add(carol);

        let line = chat("alice", "hello");
        assert_eq!(registry.broadcast(&line, Some(alice_id)), 2);

        assert_eq!(bob_rx.try_recv().unwrap(), line);
        assert_eq!(carol_rx.try_recv().unwrap(), line);
        assert!(alice_rx.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_without_exclusion() {
        let mut registry = SessionRegistry::new();
        let (alice, mut alice_rx) = session("alice");
        let (bob, mut bob_rx) = session("bob");
        registry.add(alice);
        registry.add(bob);

        assert_eq!(registry.broadcast(&ServerLine::ClearTyping, None), 2);
        assert_eq!(alice_rx.try_recv().unwrap(), ServerLine::ClearTyping);
        assert_eq!(bob_rx.try_recv().unwrap(), ServerLine::ClearTyping);
    }

    #[test]
    fn test_broadcast_isolates_closed_channel() {
        let mut registry = SessionRegistry::new();
        let (alice, _alice_rx) = session("alice");
        let (bob, bob_rx) = session("bob");
        let (carol, mut carol_rx) = session("carol");
        let (dave, mut dave_rx) = session("dave");
        let alice_id = alice.id;
        let bob_id = bob.id;
        registry.add(alice);
        registry.add(bob);
        registry.add(carol);
        registry.add(dave);

        // Bob's connection is gone but his handler has not left yet
        drop(bob_rx);

        let line = chat("alice", "anyone there?");
        assert_eq!(registry.broadcast(&line, Some(alice_id)), 2);
        assert_eq!(carol_rx.try_recv().unwrap(), line);
        assert_eq!(dave_rx.try_recv().unwrap(), line);

        // Left in place for the owning handler to remove
        assert!(registry.contains(bob_id));
    }

    #[test]
    fn test_broadcast_to_empty_registry() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.broadcast(&ServerLine::ClearTyping, None), 0);
    }
}
