//! Matchmaking and game sessions for Mess.
//!
//! Everything here is synchronous and transport-agnostic. A connection is
//! seen only as a [`ConnectionHandle`]: an ID plus a channel that outbound
//! [`ServerMessage`](mess_protocol::ServerMessage)s are pushed onto.
//!
//! # Key types
//!
//! - [`Dispatcher`] — entry point; routes frames and disconnects
//! - [`MatchmakingQueue`] — the single waiting slot
//! - [`Session`] — one game between two connections
//! - [`SessionRegistry`] — live sessions, indexed by participant
//!
//! ```text
//! init_game → MatchmakingQueue ──pair──→ Session ──terminal──→ removed
//! move      → SessionRegistry → Session::propose_move → both outboxes
//! ```

mod dispatcher;
mod error;
mod handle;
mod queue;
mod registry;
mod session;

pub use dispatcher::{DisconnectOutcome, Dispatcher};
pub use error::SessionError;
pub use handle::{ConnectionHandle, Outbox};
pub use queue::MatchmakingQueue;
pub use registry::SessionRegistry;
pub use session::{GameEnding, MoveReport, Session, SessionId, SessionState};
