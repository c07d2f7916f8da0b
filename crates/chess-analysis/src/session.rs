//! One UCI engine subprocess per analysis request.
//!
//! A session wraps exactly one engine process and is never reused: start,
//! one search, shutdown. Stdout is drained by a dedicated reader thread
//! into an mpsc channel, so every read the session performs is bounded by
//! `recv_timeout` and a hung engine can never block a request forever.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use thiserror::Error;
use uci::{EngineCommand, EngineMessage, GoLimit, SearchInfo};

/// How often `shutdown` polls for the process to exit after `quit`.
const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long after `stop` the engine gets to produce its `bestmove`.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Errors that can occur when working with an engine subprocess.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to spawn or talk to the engine process.
    #[error("failed to spawn engine: {0}")]
    Spawn(#[from] std::io::Error),
    /// Engine executable was not found at the configured path.
    #[error("engine not found at path: {0}")]
    NotFound(String),
    /// The engine did not complete the UCI handshake in time.
    #[error("engine handshake timed out")]
    HandshakeTimeout,
    /// The engine exited without ever speaking recognizable UCI.
    #[error("engine produced no recognizable UCI output")]
    Protocol,
    /// The engine exited mid-search after having spoken valid UCI.
    #[error("engine exited during search")]
    Crash,
    /// The search deadline and the post-`stop` grace window both expired.
    #[error("engine produced no result within the deadline")]
    SearchTimeout,
}

/// Where a session is in its single-use lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Handshaking,
    Ready,
    Analyzing,
    Finished,
    Faulted,
}

/// Engine subprocess configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the UCI engine executable.
    pub path: PathBuf,
    /// Extra arguments passed to the executable.
    pub args: Vec<String>,
    /// Bound on each handshake exchange (`uciok`, `readyok`).
    pub handshake_timeout: Duration,
    /// How long `shutdown` waits after `quit` before killing.
    pub quit_grace: Duration,
    /// Slack added to a `movetime` search before declaring a timeout.
    pub search_margin: Duration,
    /// Total deadline for depth-limited searches, which carry no
    /// intrinsic time bound.
    pub depth_deadline: Duration,
}

impl EngineConfig {
    /// Creates a config with default timeouts for the given executable.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EngineConfig {
            path: path.into(),
            args: Vec::new(),
            handshake_timeout: Duration::from_secs(10),
            quit_grace: Duration::from_millis(300),
            search_margin: Duration::from_secs(10),
            depth_deadline: Duration::from_secs(120),
        }
    }
}

/// The result of one finished search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// The engine's chosen move, `None` when it reported no move
    /// (`(none)` / `0000`).
    pub best_move: Option<String>,
    /// The last reportable `info` snapshot seen before `bestmove`.
    pub info: Option<SearchInfo>,
    /// Wall time from `go` to `bestmove`.
    pub elapsed: Duration,
}

/// A single-use UCI engine session.
pub struct EngineSession {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
    name: String,
    state: SessionState,
    config: EngineConfig,
    shut_down: bool,
}

impl EngineSession {
    /// Spawns the engine and performs the UCI handshake.
    pub fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        if !config.path.exists() {
            return Err(EngineError::NotFound(config.path.display().to_string()));
        }

        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(missing_stdio)?;
        let stdout = child.stdout.take().ok_or_else(missing_stdio)?;

        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let mut session = EngineSession {
            child,
            stdin: BufWriter::new(stdin),
            rx,
            name: String::new(),
            state: SessionState::Handshaking,
            config: config.clone(),
            shut_down: false,
        };

        match session.handshake() {
            Ok(()) => {
                session.state = SessionState::Ready;
                Ok(session)
            }
            Err(err) => {
                session.state = SessionState::Faulted;
                session.shutdown();
                Err(err)
            }
        }
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.send(&EngineCommand::Uci)?;
        self.await_handshake_message(|msg| matches!(msg, EngineMessage::UciOk))?;

        // Fresh search state before the one search this session runs;
        // the readyok that follows confirms the engine processed it.
        self.send(&EngineCommand::NewGame)?;
        self.send(&EngineCommand::IsReady)?;
        self.await_handshake_message(|msg| matches!(msg, EngineMessage::ReadyOk))?;

        if self.name.is_empty() {
            self.name = "unknown engine".to_string();
        }
        Ok(())
    }

    /// Reads until `accept` matches, remembering any `id name` seen along
    /// the way. The whole exchange shares one handshake deadline.
    fn await_handshake_message(
        &mut self,
        accept: impl Fn(&EngineMessage) -> bool,
    ) -> Result<(), EngineError> {
        let deadline = Instant::now() + self.config.handshake_timeout;
        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(EngineError::HandshakeTimeout)?;
            match self.rx.recv_timeout(remaining) {
                Ok(line) => match EngineMessage::parse(&line) {
                    Some(EngineMessage::Id {
                        name: Some(name), ..
                    }) => self.name = name,
                    Some(msg) if accept(&msg) => return Ok(()),
                    Some(_) => {}
                    None => {}
                },
                Err(RecvTimeoutError::Timeout) => return Err(EngineError::HandshakeTimeout),
                Err(RecvTimeoutError::Disconnected) => return Err(EngineError::Protocol),
            }
        }
    }

    /// Runs one search and reads engine output until `bestmove`.
    ///
    /// The deadline is the move time plus a protocol margin, or the
    /// configured depth deadline for depth-limited searches. On expiry a
    /// single `stop` is sent; if the engine still produces no `bestmove`
    /// within the grace window the session faults with
    /// [`EngineError::SearchTimeout`].
    pub fn analyze(
        &mut self,
        fen: &str,
        moves: &[String],
        limit: GoLimit,
    ) -> Result<SearchReport, EngineError> {
        if self.state != SessionState::Ready {
            return Err(EngineError::Protocol);
        }
        self.state = SessionState::Analyzing;

        self.send_during_search(&EngineCommand::Position {
            fen: Some(fen.to_string()),
            moves: moves.to_vec(),
        })?;
        self.send_during_search(&EngineCommand::Go(limit))?;

        let mut deadline = match limit {
            GoLimit::MoveTime(ms) => Duration::from_millis(ms) + self.config.search_margin,
            GoLimit::Depth(_) => self.config.depth_deadline,
        };

        let start = Instant::now();
        let mut stop_sent = false;
        let mut snapshot: Option<SearchInfo> = None;
        let mut parsed_any_info = false;

        loop {
            let elapsed = start.elapsed();
            if elapsed >= deadline {
                if !stop_sent {
                    self.send_during_search(&EngineCommand::Stop)?;
                    stop_sent = true;
                    deadline = elapsed + STOP_GRACE;
                    continue;
                }
                self.state = SessionState::Faulted;
                return Err(EngineError::SearchTimeout);
            }

            match self.rx.recv_timeout(deadline - elapsed) {
                Ok(line) => match EngineMessage::parse(&line) {
                    Some(EngineMessage::Info(info)) => {
                        parsed_any_info = true;
                        // Latest complete snapshot wins.
                        if info.is_reportable() {
                            snapshot = Some(info);
                        }
                    }
                    Some(EngineMessage::BestMove { mv, .. }) => {
                        self.state = SessionState::Finished;
                        return Ok(SearchReport {
                            best_move: meaningful_bestmove(mv),
                            info: snapshot,
                            elapsed: start.elapsed(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        if !line.trim().is_empty() {
                            log::warn!("skipping unrecognized engine line: {}", line);
                        }
                    }
                },
                Err(RecvTimeoutError::Timeout) => {
                    // Handled at the top of the loop.
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.state = SessionState::Faulted;
                    return Err(if parsed_any_info {
                        EngineError::Crash
                    } else {
                        EngineError::Protocol
                    });
                }
            }
        }
    }

    /// Terminates the engine: `quit`, a grace period, then `kill`.
    ///
    /// Idempotent; also invoked from `Drop` so an early return or panic
    /// never leaks the subprocess.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let _ = self.send(&EngineCommand::Quit);
        let deadline = Instant::now() + self.config.quit_grace;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            std::thread::sleep(QUIT_POLL_INTERVAL);
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    /// The engine's name as reported via `id name`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The subprocess id, for diagnostics.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn send(&mut self, command: &EngineCommand) -> Result<(), std::io::Error> {
        writeln!(self.stdin, "{}", command.to_uci())?;
        self.stdin.flush()
    }

    fn send_during_search(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        self.send(command).map_err(|_| {
            self.state = SessionState::Faulted;
            EngineError::Crash
        })
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn missing_stdio() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "engine stdio unavailable")
}

/// Engines report `(none)` (or `0000`) when there is no move to make.
fn meaningful_bestmove(mv: String) -> Option<String> {
    if mv == "(none)" || mv == "0000" {
        None
    } else {
        Some(mv)
    }
}
