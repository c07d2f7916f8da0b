//! Replaying a move list from a starting position.

use crate::{IllegalMoveError, Position, UciMove};
use std::fmt;
use thiserror::Error;

/// Why a move in a replayed list was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayErrorKind {
    /// The text is not coordinate notation at all.
    Malformed,
    /// The move parses but no legal move in its position matches it.
    Illegal,
}

impl fmt::Display for ReplayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayErrorKind::Malformed => write!(f, "is not valid coordinate notation"),
            ReplayErrorKind::Illegal => write!(f, "is illegal in its position"),
        }
    }
}

/// A rejected move, identified by its zero-based index in the list.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("move {index} ('{text}') {kind}")]
pub struct ReplayError {
    pub index: usize,
    pub text: String,
    pub kind: ReplayErrorKind,
}

/// The result of a successful replay.
#[derive(Debug, Clone)]
pub struct Replay {
    /// The position after the last move.
    pub position: Position,
    /// Every position along the way, starting position first, final
    /// position last. Used for repetition counting.
    pub history: Vec<Position>,
}

impl Replay {
    /// Counts how many positions in the history share the final position's
    /// repetition signature, the final position included.
    pub fn final_repetition_count(&self) -> usize {
        let key = self.position.repetition_key();
        self.history
            .iter()
            .filter(|p| p.repetition_key() == key)
            .count()
    }
}

/// Applies each move in order to `start`, stopping at the first failure.
///
/// Moves are coordinate notation strings ("e2e4", "e7e8q"). A promotion
/// without a piece suffix promotes to a queen.
pub fn replay<S: AsRef<str>>(start: &Position, moves: &[S]) -> Result<Replay, ReplayError> {
    let mut history = Vec::with_capacity(moves.len() + 1);
    history.push(start.clone());
    let mut position = start.clone();

    for (index, text) in moves.iter().enumerate() {
        let text = text.as_ref();
        let request = UciMove::parse(text).ok_or_else(|| ReplayError {
            index,
            text: text.to_string(),
            kind: ReplayErrorKind::Malformed,
        })?;
        position = position
            .apply(&request)
            .map_err(|_: IllegalMoveError| ReplayError {
                index,
                text: text.to_string(),
                kind: ReplayErrorKind::Illegal,
            })?;
        history.push(position.clone());
    }

    Ok(Replay { position, history })
}
