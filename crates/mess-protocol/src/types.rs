//! Wire types exchanged between browsers and the relay.
//!
//! Every frame is a JSON object with a `type` discriminator. Client frames
//! carry their data inline or under `payload`; server frames always put it
//! under `payload`:
//!
//! ```text
//! client → server   {"type":"init_game"}
//!                   {"type":"move","payload":{"from":"e2","to":"e4"}}
//! server → client   {"type":"init_game","payload":{"color":"white"}}
//!                   {"type":"move","payload":{"from":"e2","to":"e4"}}
//!                   {"type":"game_over","payload":{"winner":"white","reason":"checkmate"}}
//!                   {"type":"opponent_disconnected","payload":{"message":"..."}}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Text sent to the surviving participant when their opponent drops.
pub const OPPONENT_DISCONNECTED_MESSAGE: &str = "Your opponent has disconnected";

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Side of the board. The first player paired is always white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board square in algebraic notation (`a1` through `h8`).
///
/// Squares are checked when a frame is decoded, so a proposal naming `z9`
/// never reaches the rules engine. On the wire a square is just its string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Builds a square from a zero-based file (a = 0) and rank (1 = 0).
    #[must_use]
    pub const fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// Zero-based file index (`a` = 0).
    pub const fn file(self) -> u8 {
        self.file
    }

    /// Zero-based rank index (`1` = 0).
    pub const fn rank(self) -> u8 {
        self.rank
    }
}

impl FromStr for Square {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Ok(Self {
                file: f - b'a',
                rank: r - b'1',
            }),
            _ => Err(ProtocolError::InvalidSquare(s.to_string())),
        }
    }
}

impl TryFrom<String> for Square {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_string()
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file) as char;
        let rank = (b'1' + self.rank) as char;
        write!(f, "{file}{rank}")
    }
}

// ---------------------------------------------------------------------------
// PieceKind
// ---------------------------------------------------------------------------

/// A piece a pawn may promote to. Serialized as its lowercase letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
}

impl PieceKind {
    /// The lowercase letter used in UCI and on the wire.
    pub const fn letter(self) -> char {
        match self {
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
        }
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A proposed (client → server) or relayed (server → client) move.
///
/// The relay echoes the exact value it accepted, so fields the client left
/// out (usually `promotion`) stay out of the echo as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// A move with no promotion piece.
    #[must_use]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Parses `"e2", "e4"` style squares. Handy in tests and tools.
    pub fn parse(from: &str, to: &str) -> Result<Self, ProtocolError> {
        Ok(Self::new(from.parse()?, to.parse()?))
    }

    /// Sets the promotion piece.
    #[must_use]
    pub const fn with_promotion(mut self, piece: PieceKind) -> Self {
        self.promotion = Some(piece);
        self
    }
}

impl fmt::Display for Move {
    /// UCI notation: `e2e4`, `a7a8q`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.letter())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Game end
// ---------------------------------------------------------------------------

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEndReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl GameEndReason {
    /// `true` for every reason except checkmate.
    pub const fn is_draw(self) -> bool {
        !matches!(self, Self::Checkmate)
    }
}

impl fmt::Display for GameEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::InsufficientMaterial => "insufficient material",
            Self::FiftyMoveRule => "fifty-move rule",
            Self::ThreefoldRepetition => "threefold repetition",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Frames a browser sends to the relay.
///
/// `#[serde(tag = "type")]` makes this "internally tagged": the variant name
/// sits next to the data in one JSON object. Unknown `type` values fail to
/// decode, which the dispatcher treats as malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter matchmaking.
    InitGame,

    /// Propose a move in the current game.
    ///
    /// The published web client nests the move under `move`; `payload` is
    /// the canonical key and what we emit.
    Move {
        #[serde(rename = "payload", alias = "move")]
        mv: Move,
    },
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Frames the relay sends to a browser.
///
/// Adjacently tagged: `{"type": ..., "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// You have been paired; this is your side.
    InitGame { color: Color },

    /// A move was accepted. Sent to both participants, including the mover.
    Move(Move),

    /// The game reached a terminal position. `winner` is `None` for draws.
    GameOver {
        winner: Option<Color>,
        reason: GameEndReason,
    },

    /// The other participant's connection closed or failed.
    OpponentDisconnected { message: String },
}

impl ServerMessage {
    /// The notification sent when an opponent drops.
    pub fn opponent_disconnected() -> Self {
        Self::OpponentDisconnected {
            message: OPPONENT_DISCONNECTED_MESSAGE.to_string(),
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitGame { .. } => "init_game",
            Self::Move(_) => "move",
            Self::GameOver { .. } => "game_over",
            Self::OpponentDisconnected { .. } => "opponent_disconnected",
        }
    }
}
