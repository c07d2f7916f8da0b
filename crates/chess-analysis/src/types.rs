//! Request and response contract types.

use crate::score::Evaluation;
use crate::session::SearchReport;
use chess_rules::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uci::GoLimit;

/// How long the engine may search.
///
/// On the wire this is the pair `search_type` ∈ {`depth`, `time`} plus a
/// positive `search_value` (plies for depth, seconds for time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "search_type", content = "search_value", rename_all = "lowercase")]
pub enum SearchLimit {
    /// Search to exactly this depth in plies.
    Depth(u32),
    /// Search for this long, in seconds.
    #[serde(rename = "time")]
    MoveTime(f64),
}

/// A search limit that cannot be handed to an engine.
#[derive(Debug, Error, PartialEq)]
#[error("{0}")]
pub struct LimitError(String);

impl SearchLimit {
    /// Validates the limit and converts it to a `go` command argument.
    pub fn to_go_limit(self) -> Result<GoLimit, LimitError> {
        match self {
            SearchLimit::Depth(0) => {
                Err(LimitError("depth must be at least 1 ply".to_string()))
            }
            SearchLimit::Depth(plies) => Ok(GoLimit::Depth(plies)),
            SearchLimit::MoveTime(seconds) => {
                if !seconds.is_finite() || seconds <= 0.0 {
                    return Err(LimitError(format!(
                        "search time must be a positive number of seconds, got {}",
                        seconds
                    )));
                }
                Ok(GoLimit::MoveTime((seconds * 1000.0).round() as u64))
            }
        }
    }
}

/// One analysis request: a starting position, the moves played since, and
/// a search limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// FEN of the position the move list starts from.
    pub starting_position: String,
    /// Moves played from the starting position, in coordinate notation.
    #[serde(default)]
    pub moves: Vec<String>,
    #[serde(flatten)]
    pub limit: SearchLimit,
}

/// Engine output for one analyzed position.
///
/// Every field is `None` when the engine reported a best move without any
/// usable search information.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Best move in coordinate notation.
    pub best_move: Option<String>,
    /// Normalized score string: `"mate in N"` or decimal pawns.
    pub score: Option<String>,
    /// Depth reached in plies.
    pub depth: Option<u32>,
    /// Search time in seconds.
    pub time: Option<f64>,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Nodes per second.
    pub nps: Option<u64>,
    /// Principal variation, space-separated coordinate moves.
    pub pv: Option<String>,
}

impl AnalysisSummary {
    /// Builds the summary from a finished search, normalizing the score
    /// for the side that was to move in the analyzed position.
    pub fn from_report(report: &SearchReport, side_to_move: Color) -> Self {
        let info = match &report.info {
            Some(info) => info,
            None => return AnalysisSummary::default(),
        };

        let score = info
            .score
            .map(|raw| Evaluation::normalize(raw, side_to_move).to_string());
        let best_move = report
            .best_move
            .clone()
            .or_else(|| info.pv.first().cloned());

        AnalysisSummary {
            best_move,
            score,
            depth: info.depth,
            time: info.time.map(|ms| ms as f64 / 1000.0),
            nodes: info.nodes,
            nps: info.nps,
            pv: Some(info.pv.join(" ")),
        }
    }
}

/// The response contract: either the game is already over, or a search
/// result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    GameOver {
        game_over: bool,
        reason: &'static str,
    },
    Analysis(AnalysisSummary),
}

impl AnalysisOutcome {
    /// Builds the game-over variant for a terminal classification.
    pub fn game_over(reason: &'static str) -> Self {
        AnalysisOutcome::GameOver {
            game_over: true,
            reason,
        }
    }
}
