//! The analysis pipeline: replay, classify, search, normalize.

use crate::session::{EngineConfig, EngineError, EngineSession, SearchReport};
use crate::types::{AnalysisOutcome, AnalysisRequest, AnalysisSummary, LimitError};
use chess_rules::{classify, replay, FenError, Position, ReplayError};
use thiserror::Error;
use uci::GoLimit;

/// Everything that can go wrong with an analysis request.
///
/// The first three variants are client errors and are always detected
/// before any subprocess is spawned.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid starting position: {0}")]
    InvalidPosition(#[from] FenError),
    #[error("cannot replay move history: {0}")]
    Replay(#[from] ReplayError),
    #[error("invalid search limit: {0}")]
    InvalidLimit(#[from] LimitError),
    #[error("engine failed to start: {0}")]
    EngineStartup(#[source] EngineError),
    #[error("engine broke protocol: {0}")]
    EngineProtocol(#[source] EngineError),
    #[error("engine crashed: {0}")]
    EngineCrash(#[source] EngineError),
    #[error("engine timed out: {0}")]
    EngineTimeout(#[source] EngineError),
}

impl AnalysisError {
    /// Stable machine-readable identifier for each failure class.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidPosition(_) => "invalid_position",
            AnalysisError::Replay(_) => "illegal_move",
            AnalysisError::InvalidLimit(_) => "invalid_limit",
            AnalysisError::EngineStartup(_) => "engine_unavailable",
            AnalysisError::EngineProtocol(_) => "engine_protocol",
            AnalysisError::EngineCrash(_) => "engine_crashed",
            AnalysisError::EngineTimeout(_) => "engine_timeout",
        }
    }

    /// For replay failures, the index of the offending move.
    pub fn move_index(&self) -> Option<usize> {
        match self {
            AnalysisError::Replay(err) => Some(err.index),
            _ => None,
        }
    }
}

/// One engine's worth of search capability, behind a trait so tests can
/// substitute a double and count spawns.
pub trait SearchEngine {
    fn analyze(
        &mut self,
        fen: &str,
        moves: &[String],
        limit: GoLimit,
    ) -> Result<SearchReport, EngineError>;

    fn shutdown(&mut self);
}

impl SearchEngine for EngineSession {
    fn analyze(
        &mut self,
        fen: &str,
        moves: &[String],
        limit: GoLimit,
    ) -> Result<SearchReport, EngineError> {
        EngineSession::analyze(self, fen, moves, limit)
    }

    fn shutdown(&mut self) {
        EngineSession::shutdown(self);
    }
}

/// Creates one engine per request.
pub trait EngineLauncher {
    type Engine: SearchEngine;

    fn launch(&self) -> Result<Self::Engine, EngineError>;
}

/// Launches real UCI engine subprocesses.
pub struct UciLauncher {
    config: EngineConfig,
}

impl UciLauncher {
    pub fn new(config: EngineConfig) -> Self {
        UciLauncher { config }
    }
}

impl EngineLauncher for UciLauncher {
    type Engine = EngineSession;

    fn launch(&self) -> Result<EngineSession, EngineError> {
        EngineSession::start(&self.config)
    }
}

/// Drives one analysis request end to end.
///
/// Holds only the launcher, so a single coordinator can serve concurrent
/// requests; each request owns its engine subprocess.
pub struct AnalysisCoordinator<L: EngineLauncher = UciLauncher> {
    launcher: L,
}

impl AnalysisCoordinator<UciLauncher> {
    /// Coordinator backed by a real engine executable.
    pub fn with_engine(config: EngineConfig) -> Self {
        AnalysisCoordinator::new(UciLauncher::new(config))
    }
}

impl<L: EngineLauncher> AnalysisCoordinator<L> {
    pub fn new(launcher: L) -> Self {
        AnalysisCoordinator { launcher }
    }

    /// Replays the request's move history, short-circuits finished games,
    /// and otherwise runs one engine search.
    ///
    /// The engine session is shut down before any result or error is
    /// returned.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let go_limit = request.limit.to_go_limit()?;
        let start = Position::from_fen(&request.starting_position)?;
        let result = replay(&start, &request.moves)?;

        let status = classify(&result);
        if let Some(reason) = status.reason() {
            log::debug!("request is already terminal: {}", reason);
            return Ok(AnalysisOutcome::game_over(reason));
        }

        let mut engine = self
            .launcher
            .launch()
            .map_err(AnalysisError::EngineStartup)?;
        // Re-encode so only canonical FEN crosses the protocol boundary.
        let report = engine.analyze(&start.to_fen(), &request.moves, go_limit);
        engine.shutdown();

        let report = report.map_err(map_search_error)?;
        let summary = AnalysisSummary::from_report(&report, result.position.side_to_move);
        Ok(AnalysisOutcome::Analysis(summary))
    }
}

fn map_search_error(err: EngineError) -> AnalysisError {
    match err {
        EngineError::SearchTimeout => AnalysisError::EngineTimeout(err),
        EngineError::Crash => AnalysisError::EngineCrash(err),
        _ => AnalysisError::EngineProtocol(err),
    }
}
