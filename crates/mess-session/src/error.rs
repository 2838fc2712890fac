//! Error types for the session layer.
//!
//! None of these ever reach a client. The dispatcher logs them and drops
//! the offending message; they exist so the reason is visible in logs and
//! tests.

use mess_protocol::Color;
use mess_rules::RulesError;
use mess_transport::ConnectionId;

use crate::SessionId;

/// Why a client message was not acted on.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A move arrived from a connection with no live session.
    #[error("{0} has no active session")]
    NotInSession(ConnectionId),

    /// A move was routed to a session the connection does not play in.
    #[error("{0} is not a participant in session {1}")]
    NotAParticipant(ConnectionId, SessionId),

    /// The mover is not the side the board says is to move.
    #[error("{0} moved out of turn, {1} is to move")]
    NotYourTurn(ConnectionId, Color),

    /// The rules engine refused the move.
    #[error(transparent)]
    IllegalMove(#[from] RulesError),

    /// The session already reached a terminal position.
    #[error("session {0} is over")]
    SessionOver(SessionId),

    /// `init_game` from a connection that is already queued.
    #[error("{0} is already waiting for an opponent")]
    AlreadyWaiting(ConnectionId),

    /// `init_game` from a connection that is already playing.
    #[error("{0} is already in session {1}")]
    AlreadyInSession(ConnectionId, SessionId),

    /// The connection's outbound channel is closed; its handler is gone.
    #[error("cannot deliver to {0}: connection is gone")]
    Delivery(ConnectionId),
}
