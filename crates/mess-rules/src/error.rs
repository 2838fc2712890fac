//! Error types for the rules layer.

/// Reasons a rules engine refuses a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The move is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// The position is already terminal; no move is legal.
    #[error("game is already over")]
    GameOver,

    /// A FEN string could not be turned into a playable position.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}
