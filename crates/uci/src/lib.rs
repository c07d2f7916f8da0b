//! UCI (Universal Chess Interface) protocol types, seen from the GUI side.
//!
//! This crate formats the commands a controlling process sends to a UCI
//! engine and parses the messages the engine sends back. It carries no
//! I/O: callers own the subprocess pipes and feed lines through
//! [`EngineMessage::parse`].
//!
//! # Command flow
//!
//! - `uci` → `id …`, `uciok` - Initialize engine
//! - `isready` → `readyok` - Synchronization
//! - `position fen <fen> [moves <move>...]` - Set position
//! - `go movetime <ms>` / `go depth <d>` - Start search
//! - `info …` - Search progress snapshots
//! - `bestmove <move> [ponder <move>]` - Search result
//! - `stop` / `quit` - Interrupt and exit

mod command;
mod message;

pub use command::{EngineCommand, GoLimit};
pub use message::{EngineMessage, Score, SearchInfo};
