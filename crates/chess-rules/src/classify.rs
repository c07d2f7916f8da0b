//! Terminal game state detection.

use crate::{Color, Piece, Position, Replay};

/// The state of a game after a replayed move sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// The game continues; the side to move has at least one legal move.
    Ongoing,
    /// The side to move is checkmated.
    Checkmate { loser: Color },
    /// The side to move has no legal moves but is not in check.
    Stalemate,
    /// Neither side can possibly deliver mate.
    InsufficientMaterial,
    /// 100 half-moves without a pawn move or capture.
    FiftyMoveRule,
    /// The same position occurred three times across the game.
    ThreefoldRepetition,
}

impl GameStatus {
    /// Returns true for any state that ends the game.
    #[inline]
    pub const fn is_over(self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    /// Stable identifier for reporting, `None` while the game is ongoing.
    pub const fn reason(self) -> Option<&'static str> {
        match self {
            GameStatus::Ongoing => None,
            GameStatus::Checkmate { .. } => Some("checkmate"),
            GameStatus::Stalemate => Some("stalemate"),
            GameStatus::InsufficientMaterial => Some("insufficient_material"),
            GameStatus::FiftyMoveRule => Some("fifty_move_rule"),
            GameStatus::ThreefoldRepetition => Some("threefold_repetition"),
        }
    }
}

/// Classifies the position a replay ended in.
///
/// Checkmate and stalemate are checked first since they end the game
/// outright; the draw conditions follow in a fixed order so overlapping
/// conditions classify deterministically.
pub fn classify(replay: &Replay) -> GameStatus {
    let position = &replay.position;

    if position.legal_moves().is_empty() {
        return if position.is_in_check(position.side_to_move) {
            GameStatus::Checkmate {
                loser: position.side_to_move,
            }
        } else {
            GameStatus::Stalemate
        };
    }

    if insufficient_material(position) {
        return GameStatus::InsufficientMaterial;
    }

    if position.halfmove_clock >= 100 {
        return GameStatus::FiftyMoveRule;
    }

    if replay.final_repetition_count() >= 3 {
        return GameStatus::ThreefoldRepetition;
    }

    GameStatus::Ongoing
}

/// True when no sequence of legal moves can lead to mate: bare kings, a
/// lone minor piece, or only bishops all on the same square color.
fn insufficient_material(position: &Position) -> bool {
    let mut minor_count = 0;
    let mut bishop_square_colors = [false; 2];
    let mut knights = 0;

    for (sq, piece, _) in position.occupied_squares() {
        match piece {
            Piece::King => {}
            Piece::Pawn | Piece::Rook | Piece::Queen => return false,
            Piece::Knight => {
                minor_count += 1;
                knights += 1;
            }
            Piece::Bishop => {
                minor_count += 1;
                bishop_square_colors[((sq.file() + sq.rank()) % 2) as usize] = true;
            }
        }
    }

    match minor_count {
        0 | 1 => true,
        // Bishops confined to one square color can never give mate, no
        // matter how many or whose they are.
        _ => knights == 0 && !(bishop_square_colors[0] && bishop_square_colors[1]),
    }
}
