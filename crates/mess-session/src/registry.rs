//! Live sessions, indexed by ID and by participant.

use std::collections::HashMap;

use mess_rules::RulesEngine;
use mess_transport::ConnectionId;

use crate::{Session, SessionId};

/// Every live session, plus a reverse index from each participant to its
/// session.
///
/// The two maps are only ever changed together, so a connection is
/// registered exactly when its session is.
pub struct SessionRegistry<R: RulesEngine> {
    sessions: HashMap<SessionId, Session<R>>,
    by_connection: HashMap<ConnectionId, SessionId>,
}

impl<R: RulesEngine> SessionRegistry<R> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            by_connection: HashMap::new(),
        }
    }

    /// Registers a session and both its participants.
    pub fn insert(&mut self, session: Session<R>) -> SessionId {
        let id = session.id();
        self.by_connection.insert(session.white().id(), id);
        self.by_connection.insert(session.black().id(), id);
        self.sessions.insert(id, session);
        id
    }

    /// The session `conn` is playing in.
    pub fn session_of(&self, conn: ConnectionId) -> Option<SessionId> {
        self.by_connection.get(&conn).copied()
    }

    pub fn get(&self, id: SessionId) -> Option<&Session<R>> {
        self.sessions.get(&id)
    }

    /// Mutable access to the session `conn` is playing in.
    pub fn session_for_mut(
        &mut self,
        conn: ConnectionId,
    ) -> Option<&mut Session<R>> {
        let id = self.by_connection.get(&conn)?;
        self.sessions.get_mut(id)
    }

    /// Unregisters a session and both its participants.
    pub fn remove(&mut self, id: SessionId) -> Option<Session<R>> {
        let session = self.sessions.remove(&id)?;
        self.by_connection.remove(&session.white().id());
        self.by_connection.remove(&session.black().id());
        Some(session)
    }

    /// Removes whichever session `conn` is playing in.
    pub fn remove_by_connection(
        &mut self,
        conn: ConnectionId,
    ) -> Option<Session<R>> {
        let id = self.session_of(conn)?;
        self.remove(id)
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
}

impl<R: RulesEngine> Default for SessionRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
