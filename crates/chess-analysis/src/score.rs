//! White-positive score normalization.

use chess_rules::Color;
use std::fmt;
use uci::Score;

/// A position evaluation from White's point of view.
///
/// Engines report scores relative to the side to move; [`Evaluation::normalize`]
/// flips the sign when Black is to move so that positive always means White
/// is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Centipawn evaluation (positive = White advantage).
    Centipawns(i32),
    /// Forced mate in N (positive = White mates, negative = Black mates).
    MateIn(i32),
}

impl Evaluation {
    /// Converts a side-to-move relative engine score into a white-positive
    /// evaluation.
    pub fn normalize(raw: Score, side_to_move: Color) -> Self {
        let sign = match side_to_move {
            Color::White => 1,
            Color::Black => -1,
        };
        match raw {
            Score::Cp(cp) => Evaluation::Centipawns(sign * cp),
            Score::Mate(n) => Evaluation::MateIn(sign * n),
        }
    }

    /// True when the evaluation is a forced mate.
    pub const fn is_mate(self) -> bool {
        matches!(self, Evaluation::MateIn(_))
    }
}

impl fmt::Display for Evaluation {
    /// Renders the reporting string: `"mate in N"` for mates, decimal pawns
    /// for centipawn scores (`"0.35"`, `"-1.20"`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::MateIn(n) => write!(f, "mate in {}", n),
            Evaluation::Centipawns(cp) => write!(f, "{:.2}", *cp as f64 / 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_to_move_passes_through() {
        assert_eq!(
            Evaluation::normalize(Score::Cp(35), Color::White),
            Evaluation::Centipawns(35)
        );
        assert_eq!(
            Evaluation::normalize(Score::Mate(3), Color::White),
            Evaluation::MateIn(3)
        );
    }

    #[test]
    fn black_to_move_flips_sign() {
        assert_eq!(
            Evaluation::normalize(Score::Cp(35), Color::Black),
            Evaluation::Centipawns(-35)
        );
        assert_eq!(
            Evaluation::normalize(Score::Cp(-120), Color::Black),
            Evaluation::Centipawns(120)
        );
        assert_eq!(
            Evaluation::normalize(Score::Mate(3), Color::Black),
            Evaluation::MateIn(-3)
        );
        assert_eq!(
            Evaluation::normalize(Score::Mate(-2), Color::Black),
            Evaluation::MateIn(2)
        );
    }

    #[test]
    fn display_formats() {
        assert_eq!(Evaluation::Centipawns(35).to_string(), "0.35");
        assert_eq!(Evaluation::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(Evaluation::Centipawns(0).to_string(), "0.00");
        assert_eq!(Evaluation::MateIn(3).to_string(), "mate in 3");
        assert_eq!(Evaluation::MateIn(-2).to_string(), "mate in -2");
    }
}
