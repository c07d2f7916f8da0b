//! Move representation.

use crate::{Piece, Square};
use std::fmt;

/// How a move alters the board beyond relocating one piece.
///
/// The kind is derived by the move generator from the position the move is
/// generated in; callers never supply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Plain relocation, no capture.
    Quiet,
    /// Capture of the piece on the destination square.
    Capture,
    /// Pawn double push from its starting rank.
    DoublePush,
    /// En passant capture; the captured pawn sits beside the destination.
    EnPassant,
    /// Kingside castling (O-O).
    CastleKingside,
    /// Queenside castling (O-O-O).
    CastleQueenside,
}

impl MoveKind {
    /// Returns true if the move removes an enemy piece from the board.
    #[inline]
    pub const fn is_capture(self) -> bool {
        matches!(self, MoveKind::Capture | MoveKind::EnPassant)
    }

    /// Returns true if this is a castling move.
    #[inline]
    pub const fn is_castling(self) -> bool {
        matches!(self, MoveKind::CastleKingside | MoveKind::CastleQueenside)
    }
}

/// A fully-resolved chess move, valid only for the position it was
/// generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// Promotion target for pawn moves reaching the back rank.
    pub promotion: Option<Piece>,
    pub kind: MoveKind,
}

impl Move {
    /// Creates a non-promoting move.
    #[inline]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Move {
            from,
            to,
            promotion: None,
            kind,
        }
    }

    /// Creates a promoting pawn move.
    #[inline]
    pub const fn promoting(from: Square, to: Square, piece: Piece, kind: MoveKind) -> Self {
        Move {
            from,
            to,
            promotion: Some(piece),
            kind,
        }
    }

    /// Returns the UCI notation for this move (e.g., "e2e4", "e7e8q").
    pub fn to_uci(&self) -> String {
        match self.promotion.and_then(Piece::promotion_char) {
            Some(p) => format!("{}{}{}", self.from, self.to, p),
            None => format!("{}{}", self.from, self.to),
        }
    }

    /// Returns true if this generated move matches a caller-supplied
    /// origin/destination/promotion triple.
    ///
    /// A missing promotion piece matches the queen promotion, the default
    /// required by the replay contract.
    pub fn matches(&self, request: &UciMove) -> bool {
        if self.from != request.from || self.to != request.to {
            return false;
        }
        match self.promotion {
            Some(piece) => request.promotion.unwrap_or(Piece::Queen) == piece,
            None => request.promotion.is_none(),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// A caller-supplied move in UCI coordinate notation: origin, destination,
/// and an optional promotion piece. Everything else (capture, castle,
/// en passant, double push) is derived at application time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl UciMove {
    /// Parses coordinate notation such as "e2e4" or "e7e8q".
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Square::from_algebraic(s.get(0..2)?)?;
        let to = Square::from_algebraic(s.get(2..4)?)?;
        let promotion = match s.chars().nth(4) {
            Some(c) => Some(Piece::from_promotion_char(c)?),
            None => None,
        };
        Some(UciMove {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.promotion.and_then(Piece::promotion_char) {
            Some(p) => write!(f, "{}{}{}", self.from, self.to, p),
            None => write!(f, "{}{}", self.from, self.to),
        }
    }
}
