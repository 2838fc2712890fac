//! Standard chess rules via `shakmaty`.

use std::collections::HashMap;

use mess_protocol::{Color, Move, PieceKind};
use shakmaty::{
    fen::Fen, uci::UciMove, CastlingMode, Chess, EnPassantMode, Position,
};

use crate::{Outcome, RulesEngine, RulesError};

/// Halfmove clock value at which the fifty-move rule ends the game.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of one position that end the game by repetition.
const REPETITION_LIMIT: u8 = 3;

/// Orthodox chess, as played by the browser client.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardChess;

impl StandardChess {
    /// Builds a board from a FEN string instead of the starting position.
    pub fn board_from_fen(fen: &str) -> Result<ChessBoard, RulesError> {
        let fen: Fen = fen
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{e}")))?;
        Ok(ChessBoard::from_position(position))
    }
}

/// A chess position plus the history needed for repetition draws.
#[derive(Debug, Clone)]
pub struct ChessBoard {
    position: Chess,
    /// Occurrence count per position key (FEN without move counters).
    seen: HashMap<String, u8>,
}

impl ChessBoard {
    fn from_position(position: Chess) -> Self {
        let mut board = Self {
            position,
            seen: HashMap::new(),
        };
        board.record_position();
        board
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal)
            .to_string()
    }

    fn record_position(&mut self) {
        let key = position_key(&self.fen());
        *self.seen.entry(key).or_insert(0) += 1;
    }

    fn repetitions(&self) -> u8 {
        self.seen
            .get(&position_key(&self.fen()))
            .copied()
            .unwrap_or(0)
    }

    /// Resolves a proposal to a legal `shakmaty` move.
    ///
    /// A pawn reaching the last rank without a promotion piece is promoted
    /// to a queen, which is what the browser client always does. A
    /// promotion piece on a move that promotes nothing is ignored.
    fn resolve(&self, mv: &Move) -> Result<shakmaty::Move, RulesError> {
        let err = match self.to_legal(mv) {
            Ok(m) => return Ok(m),
            Err(e) => e,
        };
        let retry = match mv.promotion {
            None => mv.with_promotion(PieceKind::Queen),
            Some(_) => Move::new(mv.from, mv.to),
        };
        self.to_legal(&retry).map_err(|_| err)
    }

    fn to_legal(&self, mv: &Move) -> Result<shakmaty::Move, RulesError> {
        let uci: UciMove = mv
            .to_string()
            .parse()
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))?;
        let m = uci
            .to_move(&self.position)
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))?;
        if self.position.is_legal(&m) {
            Ok(m)
        } else {
            Err(RulesError::IllegalMove(mv.to_string()))
        }
    }
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl RulesEngine for StandardChess {
    type Board = ChessBoard;

    fn new_board() -> ChessBoard {
        ChessBoard::default()
    }

    fn apply_move(board: &mut ChessBoard, mv: &Move) -> Result<(), RulesError> {
        if Self::is_terminal(board) {
            return Err(RulesError::GameOver);
        }
        let m = board.resolve(mv)?;
        board.position = board
            .position
            .clone()
            .play(&m)
            .map_err(|_| RulesError::IllegalMove(mv.to_string()))?;
        board.record_position();
        Ok(())
    }

    fn outcome(board: &ChessBoard) -> Option<Outcome> {
        let pos = &board.position;
        if pos.is_checkmate() {
            Some(Outcome::Checkmate)
        } else if pos.is_stalemate() {
            Some(Outcome::Stalemate)
        } else if pos.is_insufficient_material() {
            Some(Outcome::InsufficientMaterial)
        } else if pos.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            Some(Outcome::FiftyMoveRule)
        } else if board.repetitions() >= REPETITION_LIMIT {
            Some(Outcome::ThreefoldRepetition)
        } else {
            None
        }
    }

    fn side_to_move(board: &ChessBoard) -> Color {
        match board.position.turn() {
            shakmaty::Color::White => Color::White,
            shakmaty::Color::Black => Color::Black,
        }
    }
}

/// Drops the halfmove clock and fullmove number from a FEN.
fn position_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
