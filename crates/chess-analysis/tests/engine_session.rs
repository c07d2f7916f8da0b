//! End-to-end session tests against scripted fake engines.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chess_analysis::{
    AnalysisCoordinator, AnalysisOutcome, AnalysisRequest, EngineConfig, EngineError,
    EngineSession, SearchLimit, SessionState,
};
use tempfile::TempDir;
use uci::{GoLimit, Score};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Writes an executable shell script that plays the engine's role.
fn fake_engine(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("fake-engine.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn config(path: PathBuf) -> EngineConfig {
    let mut config = EngineConfig::new(path);
    config.handshake_timeout = Duration::from_secs(2);
    config
}

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Emits a full handshake and one search's worth of output up front, then
/// waits for quit. Line buffering in the channel makes the early output
/// fine: the session consumes it in order.
const WELL_BEHAVED: &str = r#"
echo "id name FakeFish 1.0"
echo "uciok"
echo "readyok"
echo "info string warming up"
echo "info depth 5 score cp 42 nodes 1000 nps 10000 time 12 pv e2e4 e7e5"
echo "this line is not uci at all"
echo "info depth 8 score cp 35 nodes 5000 nps 20000 time 40 pv e2e4"
echo "bestmove e2e4 ponder e7e5"
while read line; do
  if [ "$line" = "quit" ]; then exit 0; fi
done
"#;

#[test]
fn full_session_lifecycle() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = fake_engine(&dir, WELL_BEHAVED);

    let mut session = EngineSession::start(&config(path)).unwrap();
    assert_eq!(session.name(), "FakeFish 1.0");
    assert_eq!(session.state(), SessionState::Ready);
    let pid = session.pid();

    let report = session
        .analyze(STARTPOS, &[], GoLimit::Depth(8))
        .unwrap();
    assert_eq!(session.state(), SessionState::Finished);
    assert_eq!(report.best_move.as_deref(), Some("e2e4"));

    // The later snapshot supersedes the earlier one.
    let info = report.info.unwrap();
    assert_eq!(info.depth, Some(8));
    assert_eq!(info.score, Some(Score::Cp(35)));
    assert_eq!(info.pv, vec!["e2e4"]);

    session.shutdown();
    assert!(
        !std::path::Path::new(&format!("/proc/{}", pid)).exists(),
        "engine process must be reaped after shutdown"
    );
}

#[test]
fn drop_reaps_the_process() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = fake_engine(&dir, WELL_BEHAVED);

    let session = EngineSession::start(&config(path)).unwrap();
    let pid = session.pid();
    drop(session);

    assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
}

#[test]
fn handshake_timeout() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // Never says uciok.
    let path = fake_engine(&dir, "while read line; do :; done");

    let mut cfg = config(path);
    cfg.handshake_timeout = Duration::from_millis(200);

    let started = Instant::now();
    match EngineSession::start(&cfg) {
        Err(EngineError::HandshakeTimeout) => {}
        other => panic!("expected HandshakeTimeout, got {:?}", other.map(|_| ())),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn gibberish_engine_is_a_protocol_error() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = fake_engine(&dir, "echo \"hello, I am not a chess engine\"");

    match EngineSession::start(&config(path)) {
        Err(EngineError::Protocol) => {}
        other => panic!("expected Protocol, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn exit_without_any_search_output_is_a_protocol_error() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // Handshake, then swallow the five commands seen so far (uci,
    // ucinewgame, isready, position, go) and exit without a single
    // search line.
    let body = r#"
echo "uciok"
echo "readyok"
read a; read b; read c; read d; read e
exit 0
"#;
    let path = fake_engine(&dir, body);

    let mut session = EngineSession::start(&config(path)).unwrap();
    let pid = session.pid();
    match session.analyze(STARTPOS, &[], GoLimit::Depth(5)) {
        Err(EngineError::Protocol) => {}
        other => panic!("expected Protocol, got {:?}", other.map(|_| ())),
    }
    assert_eq!(session.state(), SessionState::Faulted);

    drop(session);
    assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
}

#[test]
fn exit_after_info_is_a_crash() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let body = r#"
echo "uciok"
echo "readyok"
read a; read b; read c; read d; read e
echo "info depth 3 score cp 10 pv d2d4"
exit 0
"#;
    let path = fake_engine(&dir, body);

    let mut session = EngineSession::start(&config(path)).unwrap();
    match session.analyze(STARTPOS, &[], GoLimit::Depth(5)) {
        Err(EngineError::Crash) => {}
        other => panic!("expected Crash, got {:?}", other.map(|_| ())),
    }
    assert_eq!(session.state(), SessionState::Faulted);
}

#[test]
fn new_game_precedes_the_search() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // Completes the handshake only when the command order is
    // uci, ucinewgame, isready; otherwise the session times out.
    let body = r#"
echo "uciok"
read a; read b; read c
if [ "$a" = "uci" ] && [ "$b" = "ucinewgame" ] && [ "$c" = "isready" ]; then
  echo "readyok"
fi
read d; read e
echo "info depth 1 score cp 7 pv e2e4"
echo "bestmove e2e4"
while read line; do
  if [ "$line" = "quit" ]; then exit 0; fi
done
"#;
    let path = fake_engine(&dir, body);

    let mut session = EngineSession::start(&config(path)).unwrap();
    let report = session.analyze(STARTPOS, &[], GoLimit::Depth(1)).unwrap();
    assert_eq!(report.best_move.as_deref(), Some("e2e4"));
}

#[test]
fn unresponsive_search_times_out_and_is_killed() {
    init_logging();
    let dir = TempDir::new().unwrap();
    // Handshakes, then ignores everything including stop and quit.
    let body = r#"
echo "uciok"
echo "readyok"
while read line; do :; done
"#;
    let path = fake_engine(&dir, body);

    let mut cfg = config(path);
    cfg.search_margin = Duration::from_millis(150);

    let mut session = EngineSession::start(&cfg).unwrap();
    let pid = session.pid();

    let started = Instant::now();
    match session.analyze(STARTPOS, &[], GoLimit::MoveTime(100)) {
        Err(EngineError::SearchTimeout) => {}
        other => panic!("expected SearchTimeout, got {:?}", other.map(|_| ())),
    }
    // movetime + margin + stop grace, with scheduling slack.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(session.state(), SessionState::Faulted);

    drop(session);
    assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
}

#[test]
fn bestmove_none_yields_no_move() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let body = r#"
echo "uciok"
echo "readyok"
echo "bestmove (none)"
while read line; do
  if [ "$line" = "quit" ]; then exit 0; fi
done
"#;
    let path = fake_engine(&dir, body);

    let mut session = EngineSession::start(&config(path)).unwrap();
    let report = session.analyze(STARTPOS, &[], GoLimit::Depth(5)).unwrap();
    assert_eq!(report.best_move, None);
    assert_eq!(report.info, None);
}

#[test]
fn coordinator_end_to_end_against_fake_engine() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = fake_engine(&dir, WELL_BEHAVED);

    let coordinator = AnalysisCoordinator::with_engine(config(path));
    let request = AnalysisRequest {
        starting_position: STARTPOS.to_string(),
        moves: vec!["e2e4".to_string(), "e7e5".to_string()],
        limit: SearchLimit::Depth(8),
    };

    let outcome = coordinator.analyze(&request).unwrap();
    let AnalysisOutcome::Analysis(summary) = outcome else {
        panic!("expected analysis outcome");
    };
    assert_eq!(summary.best_move.as_deref(), Some("e2e4"));
    // White to move after 1.e4 e5, engine-relative +35 stays positive.
    assert_eq!(summary.score.as_deref(), Some("0.35"));
    assert_eq!(summary.depth, Some(8));
    assert_eq!(summary.time, Some(0.04));
    assert_eq!(summary.nodes, Some(5000));
    assert_eq!(summary.pv.as_deref(), Some("e2e4"));

    let json = serde_json::to_value(AnalysisOutcome::Analysis(summary)).unwrap();
    assert_eq!(json["best_move"], "e2e4");
    assert_eq!(json["score"], "0.35");
    assert!(json.get("game_over").is_none());
}

#[test]
fn coordinator_short_circuits_checkmate_without_engine() {
    init_logging();
    // A path that cannot exist; reaching the engine would fail loudly.
    let coordinator =
        AnalysisCoordinator::with_engine(EngineConfig::new("/nonexistent/engine/binary"));

    let request = AnalysisRequest {
        starting_position: STARTPOS.to_string(),
        moves: ["f2f3", "e7e5", "g2g4", "d8h4"]
            .iter()
            .map(|m| m.to_string())
            .collect(),
        limit: SearchLimit::Depth(8),
    };

    let outcome = coordinator.analyze(&request).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["game_over"], true);
    assert_eq!(json["reason"], "checkmate");
}
