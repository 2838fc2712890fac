//! Rules engine adapter for Mess.
//!
//! The relay never decides chess questions itself. It holds an opaque board
//! and asks three things of it through [`RulesEngine`]: apply this move if it
//! is legal, is the game over, and whose turn is it. Swapping the engine
//! means implementing that trait; nothing above this crate looks inside a
//! board.
//!
//! # Feature Flags
//!
//! - `standard` (default) — [`StandardChess`], backed by `shakmaty`

mod engine;
mod error;
#[cfg(feature = "standard")]
mod standard;

pub use engine::{Outcome, RulesEngine};
pub use error::RulesError;
#[cfg(feature = "standard")]
pub use standard::{ChessBoard, StandardChess};
