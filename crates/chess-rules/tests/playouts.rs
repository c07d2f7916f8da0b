//! Randomized playout properties over the full rules stack.

use chess_rules::{classify, replay, GameStatus, Position, ReplayErrorKind, UciMove};
use proptest::prelude::*;

fn step(position: &Position, uci: &str) -> Position {
    position
        .apply(&UciMove::parse(uci).expect("generated move parses"))
        .expect("generated move is legal")
}

/// Plays out the picked legal moves from the start position, returning the
/// final position and the coordinate strings taken to reach it.
fn playout(picks: &[prop::sample::Index]) -> (Position, Vec<String>) {
    let mut position = Position::startpos();
    let mut recorded = Vec::new();
    for pick in picks {
        let moves = position.legal_moves();
        if moves.is_empty() {
            break;
        }
        let uci = moves[pick.index(moves.len())].to_uci();
        position = step(&position, &uci);
        recorded.push(uci);
    }
    (position, recorded)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    /// A playout of generated legal moves keeps the position structurally
    /// sound, round-trips through FEN, and is reproducible by replaying
    /// the recorded coordinate strings.
    #[test]
    fn prop_random_playout_invariants(
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..60)
    ) {
        let start = Position::startpos();
        let mut position = start.clone();
        let mut recorded: Vec<String> = Vec::new();

        for pick in picks {
            let moves = position.legal_moves();
            if moves.is_empty() {
                break;
            }
            let mover = position.side_to_move;
            let uci = moves[pick.index(moves.len())].to_uci();
            position = step(&position, &uci);
            recorded.push(uci);

            // A legal move never leaves its own king attacked.
            prop_assert!(!position.is_in_check(mover));
            prop_assert!(position.king_square(mover).is_some());
            prop_assert!(position.king_square(mover.opposite()).is_some());

            let reparsed = Position::from_fen(&position.to_fen()).unwrap();
            prop_assert_eq!(&reparsed, &position);
        }

        let replayed = replay(&start, &recorded).unwrap();
        prop_assert_eq!(&replayed.position, &position);
        prop_assert_eq!(replayed.history.len(), recorded.len() + 1);
    }

    /// Injecting garbage anywhere in a legal sequence fails at exactly
    /// that index and classifies as malformed.
    #[test]
    fn prop_replay_pinpoints_bad_move(
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..20),
        cut in any::<prop::sample::Index>()
    ) {
        let start = Position::startpos();
        let (_, mut recorded) = playout(&picks);

        let cut = cut.index(recorded.len() + 1);
        recorded.insert(cut, "zz99".to_string());

        let err = replay(&start, &recorded).unwrap_err();
        prop_assert_eq!(err.index, cut);
        prop_assert_eq!(err.kind, ReplayErrorKind::Malformed);
    }

    /// Classification never reports checkmate or stalemate while legal
    /// moves remain.
    #[test]
    fn prop_classification_consistent_with_movegen(
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..80)
    ) {
        let start = Position::startpos();
        let (position, recorded) = playout(&picks);

        let result = replay(&start, &recorded).unwrap();
        prop_assert_eq!(&result.position, &position);

        let status = classify(&result);
        let has_moves = !result.position.legal_moves().is_empty();

        match status {
            GameStatus::Checkmate { loser } => {
                prop_assert!(!has_moves);
                prop_assert!(result.position.is_in_check(loser));
                prop_assert_eq!(loser, result.position.side_to_move);
            }
            GameStatus::Stalemate => {
                prop_assert!(!has_moves);
                prop_assert!(!result.position.is_in_check(result.position.side_to_move));
            }
            _ => prop_assert!(has_moves || status.is_over()),
        }
    }
}
