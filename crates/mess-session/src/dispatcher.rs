//! Routes decoded client frames and connection lifecycle events to the
//! queue and the sessions.

use std::marker::PhantomData;

use mess_protocol::{ClientMessage, Codec, JsonCodec, Move, ServerMessage};
use mess_rules::RulesEngine;
use mess_transport::ConnectionId;

use crate::{
    ConnectionHandle, MatchmakingQueue, MoveReport, Session, SessionError,
    SessionId, SessionRegistry,
};

/// What a disconnect tore down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The connection was neither queued nor playing.
    Unknown,
    /// The connection was the one waiting for an opponent.
    LeftQueue,
    /// The connection's session was ended and removed.
    LeftSession(SessionId),
}

/// The relay core: one matchmaking queue plus every live session.
///
/// All methods take `&mut self`. The server keeps the dispatcher behind a
/// single lock, which serializes pairing, moves and disconnects against
/// each other.
pub struct Dispatcher<R: RulesEngine, C: Codec = JsonCodec> {
    queue: MatchmakingQueue,
    registry: SessionRegistry<R>,
    codec: C,
    _rules: PhantomData<fn() -> R>,
}

impl<R: RulesEngine, C: Codec> Dispatcher<R, C> {
    pub fn new(codec: C) -> Self {
        Self {
            queue: MatchmakingQueue::new(),
            registry: SessionRegistry::new(),
            codec,
            _rules: PhantomData,
        }
    }

    /// Handles one raw inbound frame from `conn`.
    ///
    /// Frames that fail to decode, and messages the dispatcher refuses, are
    /// logged and dropped. The sender is never told.
    pub fn on_message(&mut self, conn: &ConnectionHandle, data: &[u8]) {
        let msg: ClientMessage = match self.codec.decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "dropping malformed frame");
                return;
            }
        };

        if let Err(e) = self.dispatch(conn, msg) {
            tracing::warn!(conn_id = %conn.id(), error = %e, "message ignored");
        }
    }

    /// Acts on a decoded client message.
    ///
    /// # Errors
    /// Any [`SessionError`] explaining why the message had no effect.
    pub fn dispatch(
        &mut self,
        conn: &ConnectionHandle,
        msg: ClientMessage,
    ) -> Result<(), SessionError> {
        match msg {
            ClientMessage::InitGame => self.join(conn),
            ClientMessage::Move { mv } => self.play(conn.id(), &mv).map(|_| ()),
        }
    }

    /// Puts `conn` into matchmaking, starting a session if someone waits.
    fn join(&mut self, conn: &ConnectionHandle) -> Result<(), SessionError> {
        let conn_id = conn.id();
        if let Some(session_id) = self.registry.session_of(conn_id) {
            return Err(SessionError::AlreadyInSession(conn_id, session_id));
        }
        if self.queue.is_waiting(conn_id) {
            return Err(SessionError::AlreadyWaiting(conn_id));
        }

        if let Some(session) = self.queue.enqueue_or_pair::<R>(conn.clone()) {
            self.registry.insert(session);
        }
        Ok(())
    }

    /// Forwards a move to the mover's session, retiring it if the game ends.
    fn play(
        &mut self,
        conn: ConnectionId,
        mv: &Move,
    ) -> Result<MoveReport, SessionError> {
        let session = self
            .registry
            .session_for_mut(conn)
            .ok_or(SessionError::NotInSession(conn))?;
        let report = session.propose_move(conn, mv)?;

        if report.ending.is_some() {
            let id = session.id();
            self.registry.remove(id);
            tracing::debug!(session_id = %id, "finished session removed");
        }
        Ok(report)
    }

    /// The connection's stream ended cleanly.
    pub fn on_close(&mut self, conn: ConnectionId) -> DisconnectOutcome {
        tracing::info!(conn_id = %conn, "connection closed");
        self.handle_disconnect(conn)
    }

    /// The connection failed. Treated exactly like a close.
    pub fn on_error(
        &mut self,
        conn: ConnectionId,
        error: &dyn std::error::Error,
    ) -> DisconnectOutcome {
        tracing::info!(conn_id = %conn, %error, "connection failed");
        self.handle_disconnect(conn)
    }

    /// Removes every trace of `conn`.
    ///
    /// If it was playing, the session ends and the opponent gets one
    /// `opponent_disconnected` notice. Safe to call more than once: later
    /// calls find nothing and return [`DisconnectOutcome::Unknown`].
    pub fn handle_disconnect(&mut self, conn: ConnectionId) -> DisconnectOutcome {
        if self.queue.remove(conn) {
            tracing::debug!(conn_id = %conn, "left matchmaking queue");
            return DisconnectOutcome::LeftQueue;
        }

        let Some(session) = self.registry.remove_by_connection(conn) else {
            return DisconnectOutcome::Unknown;
        };

        let id = session.id();
        if let Some(opponent) = session.opponent_of(conn) {
            match opponent.send(ServerMessage::opponent_disconnected()) {
                Ok(()) => tracing::info!(
                    session_id = %id,
                    conn_id = %conn,
                    opponent = %opponent.id(),
                    "session ended by disconnect"
                ),
                Err(e) => tracing::warn!(
                    session_id = %id,
                    opponent = %opponent.id(),
                    error = %e,
                    "could not notify opponent"
                ),
            }
        }
        DisconnectOutcome::LeftSession(id)
    }

    /// The connection waiting for an opponent, if any.
    pub fn waiting(&self) -> Option<ConnectionId> {
        self.queue.waiting()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// The live session `conn` plays in.
    pub fn session_of(&self, conn: ConnectionId) -> Option<SessionId> {
        self.registry.session_of(conn)
    }

    pub fn session(&self, id: SessionId) -> Option<&Session<R>> {
        self.registry.get(id)
    }
}

impl<R: RulesEngine, C: Codec + Default> Default for Dispatcher<R, C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}
