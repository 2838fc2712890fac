//! Wire protocol for Mess.
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Move`], [`Color`]) —
//!   the JSON frames exchanged with the browser client.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong on the way.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Session (game)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Color, GameEndReason, Move, OPPONENT_DISCONNECTED_MESSAGE,
    PieceKind, ServerMessage, Square,
};
