//! Position analysis with an external UCI engine.
//!
//! This crate reconstructs a position from an untrusted move history,
//! decides whether the game is already over, and if not runs a single
//! bounded search against a UCI engine subprocess.
//!
//! # Overview
//!
//! - [`AnalysisRequest`] / [`AnalysisOutcome`] - The request/response contract
//! - [`AnalysisCoordinator`] - The full pipeline: replay, classify, search
//! - [`EngineSession`] - One engine subprocess, used for exactly one request
//! - [`Evaluation`] - White-positive score normalization
//!
//! # Example
//!
//! ```ignore
//! use chess_analysis::{AnalysisCoordinator, AnalysisRequest, EngineConfig, SearchLimit};
//!
//! let coordinator = AnalysisCoordinator::with_engine(EngineConfig::new("./maestro"));
//! let request = AnalysisRequest {
//!     starting_position: chess_rules::Position::STARTPOS.to_string(),
//!     moves: vec!["e2e4".to_string(), "e7e5".to_string()],
//!     limit: SearchLimit::Depth(12),
//! };
//! let outcome = coordinator.analyze(&request)?;
//! println!("{}", serde_json::to_string(&outcome)?);
//! ```

pub mod coordinator;
pub mod score;
pub mod session;
pub mod types;

pub use coordinator::{AnalysisCoordinator, AnalysisError, EngineLauncher, SearchEngine, UciLauncher};
pub use score::Evaluation;
pub use session::{EngineConfig, EngineError, EngineSession, SearchReport, SessionState};
pub use types::{AnalysisOutcome, AnalysisRequest, AnalysisSummary, LimitError, SearchLimit};
