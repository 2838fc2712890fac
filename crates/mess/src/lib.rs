//! # Mess
//!
//! Two-player chess matchmaking and move relay over WebSockets.
//!
//! Clients connect, send `init_game`, and are paired first-come,
//! first-served: the first arrival plays white. From then on every legal
//! move either player makes is relayed to both of them until the game ends
//! or someone disconnects. The server owns the authoritative board; the
//! rules come from a [`RulesEngine`](rules::RulesEngine),
//! [`StandardChess`](rules::StandardChess) by default.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mess::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MessError> {
//!     let server = MessServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build::<StandardChess>()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::MessError;
pub use server::{MessServer, MessServerBuilder, ServerConfig};

pub use mess_protocol as protocol;
pub use mess_rules as rules;
pub use mess_session as session;
pub use mess_transport as transport;

/// Everything needed to run a server or write a client test.
pub mod prelude {
    pub use crate::{MessError, MessServer, MessServerBuilder, ServerConfig};
    pub use mess_protocol::{
        ClientMessage, Codec, Color, GameEndReason, JsonCodec, Move,
        PieceKind, ServerMessage, Square,
    };
    pub use mess_rules::{Outcome, RulesEngine, RulesError, StandardChess};
    pub use mess_session::{Dispatcher, SessionError, SessionId};
    pub use mess_transport::ConnectionId;
}
