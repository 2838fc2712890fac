//! A single paired game: two participants, one board, one turn protocol.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use mess_protocol::{Color, GameEndReason, Move, ServerMessage};
use mess_rules::RulesEngine;
use mess_transport::ConnectionId;

use crate::{ConnectionHandle, SessionError};

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one session for its whole life. Never reused in a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocates the next unused ID.
    pub fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of a session.
///
/// ```text
/// InProgress ──(terminal position)──→ Terminal
/// ```
///
/// One transition, taken at most once. A terminal session never resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Terminal,
}

impl SessionState {
    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!((self, target), (Self::InProgress, Self::Terminal))
    }

    /// Returns `true` once the game has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "InProgress"),
            Self::Terminal => write!(f, "Terminal"),
        }
    }
}

// ---------------------------------------------------------------------------
// Move results
// ---------------------------------------------------------------------------

/// How a finished game ended. `winner` is `None` for draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameEnding {
    pub winner: Option<Color>,
    pub reason: GameEndReason,
}

/// What an accepted move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// The side that moved.
    pub mover: Color,
    /// Set when this move ended the game.
    pub ending: Option<GameEnding>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One in-progress match between exactly two connections.
///
/// The board is private: nothing outside the session reads or writes it, and
/// the session itself only goes through `R`. Whose turn it is always comes
/// from the board, so there is no separate turn counter to drift.
pub struct Session<R: RulesEngine> {
    id: SessionId,
    white: ConnectionHandle,
    black: ConnectionHandle,
    board: R::Board,
    started_at: Instant,
    state: SessionState,
}

impl<R: RulesEngine> Session<R> {
    /// Starts a game. `first` plays white, `second` black.
    ///
    /// Both participants are told their color immediately. A failed
    /// notification is logged; the session still starts, and the dead
    /// connection's disconnect will tear it down.
    pub fn start(
        id: SessionId,
        first: ConnectionHandle,
        second: ConnectionHandle,
    ) -> Self {
        debug_assert_ne!(
            first.id(),
            second.id(),
            "a session needs two distinct participants"
        );

        let session = Self {
            id,
            white: first,
            black: second,
            board: R::new_board(),
            started_at: Instant::now(),
            state: SessionState::InProgress,
        };

        for (conn, color) in
            [(&session.white, Color::White), (&session.black, Color::Black)]
        {
            if let Err(e) = conn.send(ServerMessage::InitGame { color }) {
                tracing::warn!(
                    session_id = %id,
                    conn_id = %conn.id(),
                    error = %e,
                    "failed to send color assignment"
                );
            }
        }

        tracing::info!(
            session_id = %id,
            white = %session.white.id(),
            black = %session.black.id(),
            "session started"
        );
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn white(&self) -> &ConnectionHandle {
        &self.white
    }

    pub fn black(&self) -> &ConnectionHandle {
        &self.black
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// How long the game has been running.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The color `conn` plays, if it is a participant.
    pub fn color_of(&self, conn: ConnectionId) -> Option<Color> {
        if conn == self.white.id() {
            Some(Color::White)
        } else if conn == self.black.id() {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The other participant, if `conn` is one.
    pub fn opponent_of(&self, conn: ConnectionId) -> Option<&ConnectionHandle> {
        match self.color_of(conn)? {
            Color::White => Some(&self.black),
            Color::Black => Some(&self.white),
        }
    }

    /// The side the board says is to move.
    pub fn side_to_move(&self) -> Color {
        R::side_to_move(&self.board)
    }

    /// Validates, commits and relays a move from `conn`.
    ///
    /// On `Err` nothing changed and nothing was sent. On `Ok` both
    /// participants received the move exactly as proposed and, if it ended
    /// the game, a single `game_over`.
    ///
    /// # Errors
    /// - [`SessionError::SessionOver`] — the game already ended
    /// - [`SessionError::NotAParticipant`] — `conn` is not in this game
    /// - [`SessionError::NotYourTurn`] — `conn` is not the side to move
    /// - [`SessionError::IllegalMove`] — the rules engine refused it
    pub fn propose_move(
        &mut self,
        conn: ConnectionId,
        mv: &Move,
    ) -> Result<MoveReport, SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::SessionOver(self.id));
        }

        let mover = self
            .color_of(conn)
            .ok_or(SessionError::NotAParticipant(conn, self.id))?;
        let to_move = R::side_to_move(&self.board);
        if mover != to_move {
            return Err(SessionError::NotYourTurn(conn, to_move));
        }

        R::apply_move(&mut self.board, mv)?;

        tracing::debug!(session_id = %self.id, %mover, %mv, "move accepted");
        self.broadcast(ServerMessage::Move(*mv));

        let ending = R::outcome(&self.board).map(|outcome| {
            // The mated side is the one left to move.
            let winner = (!outcome.is_draw())
                .then(|| R::side_to_move(&self.board).opposite());
            GameEnding {
                winner,
                reason: outcome.into(),
            }
        });

        if let Some(ending) = ending {
            debug_assert!(self.state.can_transition_to(SessionState::Terminal));
            self.state = SessionState::Terminal;
            tracing::info!(
                session_id = %self.id,
                winner = ?ending.winner,
                reason = %ending.reason,
                "game over"
            );
            self.broadcast(ServerMessage::GameOver {
                winner: ending.winner,
                reason: ending.reason,
            });
        }

        Ok(MoveReport { mover, ending })
    }

    /// Sends `msg` to both participants. Delivery failures are logged only.
    fn broadcast(&self, msg: ServerMessage) {
        for conn in [&self.white, &self.black] {
            if let Err(e) = conn.send(msg.clone()) {
                tracing::warn!(
                    session_id = %self.id,
                    conn_id = %conn.id(),
                    kind = msg.kind(),
                    error = %e,
                    "delivery failed"
                );
            }
        }
    }
}

impl<R: RulesEngine> fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("white", &self.white.id())
            .field("black", &self.black.id())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
