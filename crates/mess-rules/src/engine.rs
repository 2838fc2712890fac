//! The `RulesEngine` trait: the boundary to whatever knows the rules.

use mess_protocol::{Color, GameEndReason, Move};

use crate::RulesError;

/// How a game ended, as reported by the rules engine.
///
/// There is no winner here. For checkmate the winner follows
/// from the board (the side that is *not* to move), and every other outcome
/// is a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl Outcome {
    /// `true` for every outcome except checkmate.
    pub const fn is_draw(self) -> bool {
        !matches!(self, Self::Checkmate)
    }
}

impl From<Outcome> for GameEndReason {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Checkmate => Self::Checkmate,
            Outcome::Stalemate => Self::Stalemate,
            Outcome::InsufficientMaterial => Self::InsufficientMaterial,
            Outcome::FiftyMoveRule => Self::FiftyMoveRule,
            Outcome::ThreefoldRepetition => Self::ThreefoldRepetition,
        }
    }
}

/// Move legality and game-end detection for one kind of game.
///
/// All methods are associated functions over an opaque [`Board`]; the engine
/// type itself carries no state. A session owns its board exclusively and
/// only ever touches it through these functions.
///
/// [`Board`]: RulesEngine::Board
pub trait RulesEngine: Send + Sync + 'static {
    /// The authoritative game state.
    type Board: Send + Sync + 'static;

    /// The starting position.
    fn new_board() -> Self::Board;

    /// Plays `mv` on `board`.
    ///
    /// On `Err` the board is left exactly as it was.
    fn apply_move(board: &mut Self::Board, mv: &Move) -> Result<(), RulesError>;

    /// `Some` once the position is terminal.
    fn outcome(board: &Self::Board) -> Option<Outcome>;

    /// Whether the position is terminal.
    fn is_terminal(board: &Self::Board) -> bool {
        Self::outcome(board).is_some()
    }

    /// The side whose turn it is.
    fn side_to_move(board: &Self::Board) -> Color;
}
