//! The one-slot matchmaking queue.

use mess_rules::RulesEngine;
use mess_transport::ConnectionId;

use crate::{ConnectionHandle, Session, SessionId};

/// Holds at most one connection waiting for an opponent.
///
/// Pairing is strictly first-come, first-served: the waiting connection is
/// matched with the next arrival and plays white.
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    waiting: Option<ConnectionHandle>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `conn`, or pairs it with whoever is already waiting.
    ///
    /// Returns the started session when a pair forms; the slot is then
    /// empty again. A waiting connection whose task has already exited is
    /// discarded rather than paired, and `conn` takes the slot instead.
    pub fn enqueue_or_pair<R: RulesEngine>(
        &mut self,
        conn: ConnectionHandle,
    ) -> Option<Session<R>> {
        match self.waiting.take() {
            Some(waiting) if waiting.is_closed() => {
                tracing::debug!(
                    stale = %waiting.id(),
                    conn_id = %conn.id(),
                    "replacing closed waiting connection"
                );
                self.park(conn);
                None
            }
            Some(waiting) if waiting.id() == conn.id() => {
                self.waiting = Some(waiting);
                None
            }
            Some(waiting) => {
                Some(Session::start(SessionId::next(), waiting, conn))
            }
            None => {
                self.park(conn);
                None
            }
        }
    }

    fn park(&mut self, conn: ConnectionHandle) {
        tracing::debug!(conn_id = %conn.id(), "waiting for opponent");
        self.waiting = Some(conn);
    }

    /// Clears the slot if `conn` holds it. Returns whether it did.
    pub fn remove(&mut self, conn: ConnectionId) -> bool {
        if self.is_waiting(conn) {
            self.waiting = None;
            true
        } else {
            false
        }
    }

    /// The connection currently waiting, if any.
    pub fn waiting(&self) -> Option<ConnectionId> {
        self.waiting.as_ref().map(ConnectionHandle::id)
    }

    pub fn is_waiting(&self, conn: ConnectionId) -> bool {
        self.waiting() == Some(conn)
    }
}
