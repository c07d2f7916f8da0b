//! Commands sent from the controlling process to the engine.

/// The search limit for a `go` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoLimit {
    /// Search to exactly this depth in plies.
    Depth(u32),
    /// Search for exactly this time in milliseconds.
    MoveTime(u64),
}

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Reset engine state between games.
    NewGame,
    /// Set up position. `fen: None` means the standard starting position.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Start calculating.
    Go(GoLimit),
    /// Stop calculating.
    Stop,
    /// Quit the engine.
    Quit,
}

impl EngineCommand {
    /// Format the command as a UCI protocol line (without newline).
    pub fn to_uci(&self) -> String {
        match self {
            EngineCommand::Uci => "uci".to_string(),
            EngineCommand::IsReady => "isready".to_string(),
            EngineCommand::NewGame => "ucinewgame".to_string(),
            EngineCommand::Position { fen, moves } => {
                let mut line = match fen {
                    Some(fen) => format!("position fen {}", fen),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    line.push_str(" moves ");
                    line.push_str(&moves.join(" "));
                }
                line
            }
            EngineCommand::Go(limit) => match limit {
                GoLimit::Depth(d) => format!("go depth {}", d),
                GoLimit::MoveTime(ms) => format!("go movetime {}", ms),
            },
            EngineCommand::Stop => "stop".to_string(),
            EngineCommand::Quit => "quit".to_string(),
        }
    }
}
