//! Legal move generation and move application.
//!
//! Generation is ray-based over the mailbox board: pseudo-legal moves are
//! produced per piece from fixed offset tables, then filtered by applying
//! each move and rejecting those that leave the mover's king attacked.

use crate::{Color, Move, MoveKind, Piece, Position, Square, UciMove};
use thiserror::Error;

/// A move request that no legal move in the position matches.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal move '{uci}' in position {fen}")]
pub struct IllegalMoveError {
    /// The rejected move in coordinate notation.
    pub uci: String,
    /// FEN of the position the move was rejected in.
    pub fen: String,
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

const PROMOTION_PIECES: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

impl Position {
    /// Returns true if `sq` is attacked by any piece of `attacker`.
    pub fn is_square_attacked(&self, sq: Square, attacker: Color) -> bool {
        // Pawn attacks converge on sq from the attacker's rear rank.
        let pawn_rank_delta = -attacker.pawn_direction();
        for file_delta in [-1i8, 1] {
            if let Some(from) = sq.offset(file_delta, pawn_rank_delta) {
                if self.piece_at(from) == Some((Piece::Pawn, attacker)) {
                    return true;
                }
            }
        }

        for (df, dr) in KNIGHT_OFFSETS {
            if let Some(from) = sq.offset(df, dr) {
                if self.piece_at(from) == Some((Piece::Knight, attacker)) {
                    return true;
                }
            }
        }

        for (df, dr) in KING_OFFSETS {
            if let Some(from) = sq.offset(df, dr) {
                if self.piece_at(from) == Some((Piece::King, attacker)) {
                    return true;
                }
            }
        }

        for (df, dr) in BISHOP_DIRECTIONS {
            if let Some((piece, color)) = self.first_piece_on_ray(sq, df, dr) {
                if color == attacker && matches!(piece, Piece::Bishop | Piece::Queen) {
                    return true;
                }
            }
        }

        for (df, dr) in ROOK_DIRECTIONS {
            if let Some((piece, color)) = self.first_piece_on_ray(sq, df, dr) {
                if color == attacker && matches!(piece, Piece::Rook | Piece::Queen) {
                    return true;
                }
            }
        }

        false
    }

    fn first_piece_on_ray(&self, from: Square, df: i8, dr: i8) -> Option<(Piece, Color)> {
        let mut current = from;
        while let Some(next) = current.offset(df, dr) {
            if let Some(contents) = self.piece_at(next) {
                return Some(contents);
            }
            current = next;
        }
        None
    }

    /// Returns true if the given side's king is currently attacked.
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king) => self.is_square_attacked(king, color.opposite()),
            None => false,
        }
    }

    /// Generates all legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        let us = self.side_to_move;
        let mut moves = Vec::with_capacity(48);

        for (from, piece, color) in self.occupied_squares() {
            if color != us {
                continue;
            }
            match piece {
                Piece::Pawn => self.pawn_moves(from, us, &mut moves),
                Piece::Knight => self.offset_moves(from, us, &KNIGHT_OFFSETS, &mut moves),
                Piece::Bishop => self.ray_moves(from, us, &BISHOP_DIRECTIONS, &mut moves),
                Piece::Rook => self.ray_moves(from, us, &ROOK_DIRECTIONS, &mut moves),
                Piece::Queen => {
                    self.ray_moves(from, us, &BISHOP_DIRECTIONS, &mut moves);
                    self.ray_moves(from, us, &ROOK_DIRECTIONS, &mut moves);
                }
                Piece::King => self.offset_moves(from, us, &KING_OFFSETS, &mut moves),
            }
        }

        self.castling_moves(us, &mut moves);

        moves.retain(|m| !self.apply_unchecked(m).is_in_check(us));
        moves
    }

    fn pawn_moves(&self, from: Square, us: Color, moves: &mut Vec<Move>) {
        let dir = us.pawn_direction();

        if let Some(to) = from.offset(0, dir) {
            if self.piece_at(to).is_none() {
                self.push_pawn_move(from, to, us, MoveKind::Quiet, moves);

                if from.rank() == us.pawn_start_rank() {
                    if let Some(double) = to.offset(0, dir) {
                        if self.piece_at(double).is_none() {
                            moves.push(Move::new(from, double, MoveKind::DoublePush));
                        }
                    }
                }
            }
        }

        for file_delta in [-1i8, 1] {
            if let Some(to) = from.offset(file_delta, dir) {
                match self.piece_at(to) {
                    Some((_, color)) if color != us => {
                        self.push_pawn_move(from, to, us, MoveKind::Capture, moves);
                    }
                    None if self.en_passant == Some(to) => {
                        moves.push(Move::new(from, to, MoveKind::EnPassant));
                    }
                    _ => {}
                }
            }
        }
    }

    fn push_pawn_move(
        &self,
        from: Square,
        to: Square,
        us: Color,
        kind: MoveKind,
        moves: &mut Vec<Move>,
    ) {
        if to.rank() == us.promotion_rank() {
            for piece in PROMOTION_PIECES {
                moves.push(Move::promoting(from, to, piece, kind));
            }
        } else {
            moves.push(Move::new(from, to, kind));
        }
    }

    fn offset_moves(
        &self,
        from: Square,
        us: Color,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in offsets {
            if let Some(to) = from.offset(df, dr) {
                match self.piece_at(to) {
                    None => moves.push(Move::new(from, to, MoveKind::Quiet)),
                    Some((_, color)) if color != us => {
                        moves.push(Move::new(from, to, MoveKind::Capture));
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn ray_moves(
        &self,
        from: Square,
        us: Color,
        directions: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                match self.piece_at(to) {
                    None => {
                        moves.push(Move::new(from, to, MoveKind::Quiet));
                        current = to;
                    }
                    Some((_, color)) => {
                        if color != us {
                            moves.push(Move::new(from, to, MoveKind::Capture));
                        }
                        break;
                    }
                }
            }
        }
    }

    fn castling_moves(&self, us: Color, moves: &mut Vec<Move>) {
        let back_rank = match us {
            Color::White => 0,
            Color::Black => 7,
        };
        let king_from = match Square::new(4, back_rank) {
            Some(sq) => sq,
            None => return,
        };
        if self.piece_at(king_from) != Some((Piece::King, us)) {
            return;
        }
        if self.is_in_check(us) {
            return;
        }
        let them = us.opposite();

        // Kingside: f and g files empty, king crosses f without passing
        // through an attacked square.
        if self.castling.kingside(us) {
            let f = Square::new(5, back_rank).unwrap();
            let g = Square::new(6, back_rank).unwrap();
            if self.piece_at(f).is_none()
                && self.piece_at(g).is_none()
                && !self.is_square_attacked(f, them)
            {
                moves.push(Move::new(king_from, g, MoveKind::CastleKingside));
            }
        }

        // Queenside: b, c and d files empty, king crosses d.
        if self.castling.queenside(us) {
            let b = Square::new(1, back_rank).unwrap();
            let c = Square::new(2, back_rank).unwrap();
            let d = Square::new(3, back_rank).unwrap();
            if self.piece_at(b).is_none()
                && self.piece_at(c).is_none()
                && self.piece_at(d).is_none()
                && !self.is_square_attacked(d, them)
            {
                moves.push(Move::new(king_from, c, MoveKind::CastleQueenside));
            }
        }
    }

    /// Applies a generated move, producing the successor position. The move
    /// must come from `legal_moves` on this position (or from pseudo-legal
    /// generation during filtering).
    pub(crate) fn apply_unchecked(&self, m: &Move) -> Position {
        let mut next = self.clone();
        let us = self.side_to_move;
        let moved = self.piece_at(m.from);
        let captured = self.piece_at(m.to);

        next.board[m.to.index()] = moved;
        next.board[m.from.index()] = None;

        match m.kind {
            MoveKind::EnPassant => {
                // The captured pawn sits beside the destination, on the
                // mover's own rank offset back one step.
                if let Some(victim) = m.to.offset(0, -us.pawn_direction()) {
                    next.board[victim.index()] = None;
                }
            }
            MoveKind::CastleKingside => {
                let rank = m.from.rank();
                let rook_from = Square::new(7, rank).unwrap();
                let rook_to = Square::new(5, rank).unwrap();
                next.board[rook_to.index()] = next.board[rook_from.index()];
                next.board[rook_from.index()] = None;
            }
            MoveKind::CastleQueenside => {
                let rank = m.from.rank();
                let rook_from = Square::new(0, rank).unwrap();
                let rook_to = Square::new(3, rank).unwrap();
                next.board[rook_to.index()] = next.board[rook_from.index()];
                next.board[rook_from.index()] = None;
            }
            _ => {}
        }

        if let Some(promoted) = m.promotion {
            next.board[m.to.index()] = Some((promoted, us));
        }

        next.en_passant = if m.kind == MoveKind::DoublePush {
            m.from.offset(0, us.pawn_direction())
        } else {
            None
        };

        if moved.map(|(p, _)| p) == Some(Piece::King) {
            next.castling.revoke_color(us);
        }
        for sq in [m.from, m.to] {
            match sq.index() {
                0 => next.castling.revoke_queenside(Color::White),
                7 => next.castling.revoke_kingside(Color::White),
                56 => next.castling.revoke_queenside(Color::Black),
                63 => next.castling.revoke_kingside(Color::Black),
                _ => {}
            }
        }

        let pawn_move = moved.map(|(p, _)| p) == Some(Piece::Pawn);
        if pawn_move || captured.is_some() || m.kind == MoveKind::EnPassant {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }

        if us == Color::Black {
            next.fullmove_number += 1;
        }
        next.side_to_move = us.opposite();

        next
    }

    /// Applies a caller-supplied move if it matches a legal move in this
    /// position. A promotion request without a piece suffix promotes to a
    /// queen.
    pub fn apply(&self, request: &UciMove) -> Result<Position, IllegalMoveError> {
        self.legal_moves()
            .iter()
            .find(|m| m.matches(request))
            .map(|m| self.apply_unchecked(m))
            .ok_or_else(|| IllegalMoveError {
                uci: request.to_string(),
                fen: self.to_fen(),
            })
    }
}

/// Counts leaf nodes of the legal move tree to the given depth.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = position.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|m| perft(&position.apply_unchecked(m), depth - 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn uci(s: &str) -> UciMove {
        UciMove::parse(s).unwrap()
    }

    #[test]
    fn perft_startpos() {
        let start = Position::startpos();
        assert_eq!(perft(&start, 1), 20);
        assert_eq!(perft(&start, 2), 400);
        assert_eq!(perft(&start, 3), 8902);
    }

    #[test]
    fn perft_kiwipete() {
        let p = pos(KIWIPETE);
        assert_eq!(perft(&p, 1), 48);
        assert_eq!(perft(&p, 2), 2039);
    }

    #[test]
    fn apply_simple_move() {
        let start = Position::startpos();
        let next = start.apply(&uci("e2e4")).unwrap();
        assert_eq!(
            next.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn apply_rejects_illegal_move() {
        let start = Position::startpos();
        let err = start.apply(&uci("e2e5")).unwrap_err();
        assert_eq!(err.uci, "e2e5");
        assert_eq!(err.fen, Position::STARTPOS);
    }

    #[test]
    fn apply_rejects_moving_into_check() {
        // King on e1 may not step onto a rook's file.
        let p = pos("4k3/8/8/8/8/8/5r2/4K3 w - - 0 1");
        assert!(p.apply(&uci("e1f1")).is_err());
        assert!(p.apply(&uci("e1d1")).is_ok());
    }

    #[test]
    fn pinned_piece_cannot_move_away() {
        let p = pos("4k3/8/8/8/8/4r3/4B3/4K3 w - - 0 1");
        assert!(p.apply(&uci("e2d3")).is_err());
        assert!(p.apply(&uci("e2d1")).is_err());
    }

    #[test]
    fn en_passant_capture() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        let next = p.apply(&uci("e5d6")).unwrap();
        assert_eq!(next.piece_at(Square::from_algebraic("d5").unwrap()), None);
        assert_eq!(
            next.piece_at(Square::from_algebraic("d6").unwrap()),
            Some((Piece::Pawn, Color::White))
        );
        assert_eq!(next.halfmove_clock, 0);
    }

    #[test]
    fn en_passant_expires() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1");
        assert!(p.apply(&uci("e5d6")).is_err());
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let p = pos("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let next = p.apply(&uci("a7a8")).unwrap();
        assert_eq!(
            next.piece_at(Square::from_algebraic("a8").unwrap()),
            Some((Piece::Queen, Color::White))
        );
    }

    #[test]
    fn explicit_underpromotion() {
        let p = pos("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let next = p.apply(&uci("a7a8n")).unwrap();
        assert_eq!(
            next.piece_at(Square::from_algebraic("a8").unwrap()),
            Some((Piece::Knight, Color::White))
        );
    }

    #[test]
    fn kingside_castle_moves_rook() {
        let p = pos("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        let next = p.apply(&uci("e1g1")).unwrap();
        assert_eq!(
            next.piece_at(Square::from_algebraic("g1").unwrap()),
            Some((Piece::King, Color::White))
        );
        assert_eq!(
            next.piece_at(Square::from_algebraic("f1").unwrap()),
            Some((Piece::Rook, Color::White))
        );
        assert_eq!(next.piece_at(Square::from_algebraic("h1").unwrap()), None);
        assert!(!next.castling.kingside(Color::White));
    }

    #[test]
    fn queenside_castle_moves_rook() {
        let p = pos("r3k3/8/8/8/8/8/8/4K3 b q - 0 1");
        let next = p.apply(&uci("e8c8")).unwrap();
        assert_eq!(
            next.piece_at(Square::from_algebraic("c8").unwrap()),
            Some((Piece::King, Color::Black))
        );
        assert_eq!(
            next.piece_at(Square::from_algebraic("d8").unwrap()),
            Some((Piece::Rook, Color::Black))
        );
    }

    #[test]
    fn cannot_castle_out_of_check() {
        let p = pos("4k3/8/8/8/8/8/4r3/4K2R w K - 0 1");
        assert!(p.apply(&uci("e1g1")).is_err());
    }

    #[test]
    fn cannot_castle_through_attacked_square() {
        let p = pos("4k3/8/8/8/8/8/5r2/4K2R w K - 0 1");
        assert!(p.apply(&uci("e1g1")).is_err());
    }

    #[test]
    fn cannot_castle_through_occupied_square() {
        let p = pos("4k3/8/8/8/8/8/8/4KB1R w K - 0 1");
        assert!(p.apply(&uci("e1g1")).is_err());
    }

    #[test]
    fn rook_move_revokes_castling_right() {
        let p = pos("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let next = p.apply(&uci("h1g1")).unwrap();
        assert!(!next.castling.kingside(Color::White));
        assert!(next.castling.queenside(Color::White));
    }

    #[test]
    fn rook_capture_revokes_castling_right() {
        let p = pos("r3k3/8/8/8/8/8/8/R3K3 w Qq - 0 1");
        let next = p.apply(&uci("a1a8")).unwrap();
        assert!(!next.castling.queenside(Color::Black));
        assert!(!next.castling.queenside(Color::White));
    }

    #[test]
    fn king_move_revokes_both_rights() {
        let p = pos("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let next = p.apply(&uci("e1e2")).unwrap();
        assert!(next.castling.is_empty());
    }

    #[test]
    fn halfmove_clock_bookkeeping() {
        let start = Position::startpos();
        let after_knight = start.apply(&uci("g1f3")).unwrap();
        assert_eq!(after_knight.halfmove_clock, 1);
        let after_pawn = after_knight.apply(&uci("e7e5")).unwrap();
        assert_eq!(after_pawn.halfmove_clock, 0);
        assert_eq!(after_pawn.fullmove_number, 2);
    }

    #[test]
    fn check_detection() {
        let p = pos("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1");
        assert!(p.is_in_check(Color::White));
        assert!(!p.is_in_check(Color::Black));

        let knight_check = pos("4k3/8/8/8/8/3n4/8/4K3 w - - 0 1");
        assert!(knight_check.is_in_check(Color::White));

        let blocked = pos("4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1");
        assert!(!blocked.is_in_check(Color::White));
    }

    #[test]
    fn checkmate_has_no_legal_moves() {
        // Back-rank mate: Ra8#.
        let p = pos("R6k/5ppp/8/8/8/8/8/7K b - - 0 1");
        assert!(p.is_in_check(Color::Black));
        assert!(p.legal_moves().is_empty());
    }

    #[test]
    fn stalemate_has_no_legal_moves_and_no_check() {
        let p = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(!p.is_in_check(Color::Black));
        assert!(p.legal_moves().is_empty());
    }
}
