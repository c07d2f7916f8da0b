//! Chess position representation and FEN round-trip.

use crate::{Color, Piece, Square};
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),

    #[error("{0} must have exactly one king, found {1}")]
    InvalidKingCount(Color, usize),
}

/// Castling rights flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    const WHITE_KINGSIDE: u8 = 0b0001;
    const WHITE_QUEENSIDE: u8 = 0b0010;
    const BLACK_KINGSIDE: u8 = 0b0100;
    const BLACK_QUEENSIDE: u8 = 0b1000;

    #[inline]
    const fn kingside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    #[inline]
    const fn queenside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns true if the given side may still castle kingside.
    #[inline]
    pub const fn kingside(self, color: Color) -> bool {
        (self.0 & Self::kingside_flag(color)) != 0
    }

    /// Returns true if the given side may still castle queenside.
    #[inline]
    pub const fn queenside(self, color: Color) -> bool {
        (self.0 & Self::queenside_flag(color)) != 0
    }

    /// Grants kingside castling for a color.
    #[inline]
    pub fn grant_kingside(&mut self, color: Color) {
        self.0 |= Self::kingside_flag(color);
    }

    /// Grants queenside castling for a color.
    #[inline]
    pub fn grant_queenside(&mut self, color: Color) {
        self.0 |= Self::queenside_flag(color);
    }

    /// Removes both castling rights for a color.
    #[inline]
    pub fn revoke_color(&mut self, color: Color) {
        self.0 &= !(Self::kingside_flag(color) | Self::queenside_flag(color));
    }

    /// Removes kingside castling for a color.
    #[inline]
    pub fn revoke_kingside(&mut self, color: Color) {
        self.0 &= !Self::kingside_flag(color);
    }

    /// Removes queenside castling for a color.
    #[inline]
    pub fn revoke_queenside(&mut self, color: Color) {
        self.0 &= !Self::queenside_flag(color);
    }

    /// Returns true if no side may castle.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// The contents of one square.
pub type SquareContent = Option<(Piece, Color)>;

/// Complete chess position state.
///
/// A `Position` is a value: applying a move produces a new `Position`,
/// leaving the original untouched so replay history can be compared for
/// repetition detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Mailbox board, indexed a1 = 0 .. h8 = 63.
    pub(crate) board: [SquareContent; 64],
    /// The side to move.
    pub side_to_move: Color,
    /// Castling rights.
    pub castling: CastlingRights,
    /// En passant target square (if any).
    pub en_passant: Option<Square>,
    /// Halfmove clock for the fifty-move rule.
    pub halfmove_clock: u32,
    /// Fullmove number (starts at 1, increments after Black's move).
    pub fullmove_number: u32,
}

/// The identity of a position for repetition purposes: board contents,
/// side to move, castling rights, and en passant target. Clocks are
/// deliberately excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepetitionKey {
    board: [SquareContent; 64],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
}

impl Position {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Creates the standard starting position.
    pub fn startpos() -> Self {
        Self::from_fen(Self::STARTPOS).expect("STARTPOS is valid")
    }

    /// Parses a position from a FEN string.
    ///
    /// Validates the structure of all six fields and requires exactly one
    /// king per side.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() != 6 {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let board = Self::parse_placement(parts[0])?;

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        let mut castling = CastlingRights::NONE;
        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => castling.grant_kingside(Color::White),
                    'Q' => castling.grant_queenside(Color::White),
                    'k' => castling.grant_kingside(Color::Black),
                    'q' => castling.grant_queenside(Color::Black),
                    _ => {
                        return Err(FenError::InvalidCastlingRights(format!(
                            "invalid character '{}'",
                            c
                        )))
                    }
                }
            }
        }

        let en_passant = if parts[3] == "-" {
            None
        } else {
            let sq = Square::from_algebraic(parts[3])
                .ok_or_else(|| FenError::InvalidEnPassantSquare(parts[3].to_string()))?;
            if sq.rank() != 2 && sq.rank() != 5 {
                return Err(FenError::InvalidEnPassantSquare(parts[3].to_string()));
            }
            Some(sq)
        };

        let halfmove_clock = parts[4]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidHalfmoveClock(parts[4].to_string()))?;

        let fullmove_number = parts[5]
            .parse::<u32>()
            .map_err(|_| FenError::InvalidFullmoveNumber(parts[5].to_string()))?;

        let position = Position {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        };

        for color in [Color::White, Color::Black] {
            let kings = position.count_pieces(Piece::King, color);
            if kings != 1 {
                return Err(FenError::InvalidKingCount(color, kings));
            }
        }

        Ok(position)
    }

    fn parse_placement(placement: &str) -> Result<[SquareContent; 64], FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut board: [SquareContent; 64] = [None; 64];
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            // FEN lists rank 8 first.
            let rank = 7 - rank_idx as u8;
            let mut file = 0u8;

            for c in rank_str.chars() {
                if let Some(digit) = c.to_digit(10) {
                    // Bounded after every digit; the sum can never leave u8.
                    file += digit as u8;
                    if file > 8 {
                        return Err(FenError::InvalidPiecePlacement(format!(
                            "rank {} overflows 8 squares",
                            rank + 1
                        )));
                    }
                } else if let Some(placed) = Piece::from_fen_char(c) {
                    let sq = Square::new(file, rank).ok_or_else(|| {
                        FenError::InvalidPiecePlacement(format!(
                            "rank {} overflows 8 squares",
                            rank + 1
                        ))
                    })?;
                    board[sq.index()] = Some(placed);
                    file += 1;
                } else {
                    return Err(FenError::InvalidPiecePlacement(format!(
                        "invalid character '{}' in rank {}",
                        c,
                        rank + 1
                    )));
                }
            }
            if file != 8 {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "rank {} has {} squares, expected 8",
                    rank + 1,
                    file
                )));
            }
        }

        Ok(board)
    }

    /// Converts the position to a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty_count = 0;
            for file in 0..8 {
                let sq = Square::new(file, rank).expect("file and rank in range");
                if let Some((piece, color)) = self.board[sq.index()] {
                    if empty_count > 0 {
                        fen.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    fen.push(piece.to_fen_char(color));
                } else {
                    empty_count += 1;
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(self.side_to_move.fen_char());

        fen.push(' ');
        if self.castling.is_empty() {
            fen.push('-');
        } else {
            if self.castling.kingside(Color::White) {
                fen.push('K');
            }
            if self.castling.queenside(Color::White) {
                fen.push('Q');
            }
            if self.castling.kingside(Color::Black) {
                fen.push('k');
            }
            if self.castling.queenside(Color::Black) {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }

    /// Returns the piece and color at the given square, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> SquareContent {
        self.board[sq.index()]
    }

    /// Returns the square of the given side's king.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.squares_with(Piece::King, color).next()
    }

    /// Iterates over squares holding a given piece of a given color.
    pub(crate) fn squares_with(
        &self,
        piece: Piece,
        color: Color,
    ) -> impl Iterator<Item = Square> + '_ {
        self.board.iter().enumerate().filter_map(move |(idx, c)| {
            (*c == Some((piece, color))).then(|| Square::from_index(idx as u8).unwrap())
        })
    }

    /// Iterates over all occupied squares with their contents.
    pub(crate) fn occupied_squares(&self) -> impl Iterator<Item = (Square, Piece, Color)> + '_ {
        self.board.iter().enumerate().filter_map(|(idx, c)| {
            c.map(|(piece, color)| (Square::from_index(idx as u8).unwrap(), piece, color))
        })
    }

    fn count_pieces(&self, piece: Piece, color: Color) -> usize {
        self.squares_with(piece, color).count()
    }

    /// Returns the repetition signature of this position.
    pub fn repetition_key(&self) -> RepetitionKey {
        RepetitionKey {
            board: self.board,
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.en_passant,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}
