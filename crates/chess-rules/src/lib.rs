//! Self-contained chess legality engine.
//!
//! This crate provides everything needed to reconstruct a board state from
//! a FEN string plus a move history and decide whether the game is over:
//! - [`Position`]: immutable-per-ply board state with FEN round-trip
//! - legal move generation and application ([`Position::legal_moves`],
//!   [`Position::apply`])
//! - [`replay`]: fail-fast replay of an untrusted move list
//! - [`classify`]: terminal-state detection (checkmate, stalemate, draws)

mod classify;
mod color;
mod movegen;
mod moves;
mod piece;
mod position;
mod replay;
mod square;

pub use classify::{classify, GameStatus};
pub use color::Color;
pub use movegen::{perft, IllegalMoveError};
pub use moves::{Move, MoveKind, UciMove};
pub use piece::Piece;
pub use position::{CastlingRights, FenError, Position, RepetitionKey};
pub use replay::{replay, Replay, ReplayError, ReplayErrorKind};
pub use square::Square;
