//! Destructive move application. The move is assumed to have been validated
//! by the generator and to carry the correct special flag; undo is the
//! caller's business (the game driver keeps position snapshots).

use crate::bitboard::BitboardExt;
use crate::board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece, Position};
use crate::hash::zobrist::{ZobristKeys, xor_castling_rights_delta, zobrist_keys};
use crate::moves::types::{FLAG_CASTLING, FLAG_EN_PASSANT, FLAG_PROMOTION, Move};
use crate::square::Square;
use tracing::error;

/// Rook home squares paired with the castling right they guard. Observed
/// after every move: a right survives only while its rook sits at home.
const ROOK_HOME_SQUARES: [(u8, u8, Color); 4] = [
    (63, CASTLE_WK, Color::White), // h1
    (56, CASTLE_WQ, Color::White), // a1
    (7, CASTLE_BK, Color::Black),  // h8
    (0, CASTLE_BQ, Color::Black),  // a8
];

/// Apply `mv` to `board`. Mutates bitboards, position lists, castling and
/// en passant state and the zobrist key in one pass, then flips the side to
/// move. A move from an empty origin square is a caller bug: it is logged
/// and the position is left untouched.
pub fn apply_move(board: &mut Position, mv: Move) {
    let color = board.side_to_move;
    let origin = mv.origin().index();
    let destination = mv.destination().index();

    let Some(piece) = board.piece_of_color_at(origin, color) else {
        error!(%mv, ?color, "apply_move called with no piece at the origin");
        return;
    };

    let keys = zobrist_keys();

    // En passant state. Hash the stale file out first; a fresh double push
    // hashes the new file in.
    if let Some(ep) = board.en_passant {
        board.zobrist ^= keys.ep_file[ep.file() as usize];
    }
    if piece == Piece::Pawn && (origin as i16 - destination as i16).abs() == 16 {
        let ep = (origin + destination) / 2;
        board.en_passant = Some(Square::from_index(ep));
        board.zobrist ^= keys.ep_file[(ep % 8) as usize];
    } else {
        board.en_passant = None;
    }

    // Capture: clear the destination from whichever board holds it.
    if let Some((captured_color, captured_piece)) = clear_destination(board, destination) {
        board.erase_position(captured_color, captured_piece, destination);
        board.zobrist ^=
            keys.piece[captured_color as usize][captured_piece as usize][destination as usize];
    }

    // Move the piece itself.
    let moving_bb = &mut board.piece_bb[color as usize][piece as usize];
    moving_bb.clear_bit(origin);
    moving_bb.set_bit(destination);
    board.swap_position(color, piece, origin, destination);
    board.zobrist ^= keys.piece[color as usize][piece as usize][origin as usize];
    board.zobrist ^= keys.piece[color as usize][piece as usize][destination as usize];

    update_castling_rights(board, color, piece, keys);

    match mv.flag() {
        FLAG_CASTLING => castle_rook_hop(board, color, destination, keys),
        FLAG_EN_PASSANT => capture_en_passant(board, color, destination, keys),
        FLAG_PROMOTION => promote(board, color, destination, mv.promotion_piece(), keys),
        _ => {}
    }

    board.side_to_move = color.opposite();
    board.zobrist ^= keys.side_to_move;
    board.half_move_count += 1;

    #[cfg(debug_assertions)]
    {
        board.assert_hash();
        board.assert_position_lists();
    }
}

/// Apply on a copy; recursion frames in the search work on copies.
#[inline]
pub fn applied(board: &Position, mv: Move) -> Position {
    let mut next = board.clone();
    apply_move(&mut next, mv);
    next
}

/// Clear `square` from all twelve bitboards and report which one changed.
/// At most one can change; the probe is a linear pass over the boards.
fn clear_destination(board: &mut Position, square: u8) -> Option<(Color, Piece)> {
    let mask = !(1u64 << square);
    for color in [Color::White, Color::Black] {
        for piece in Piece::ALL {
            let bb = &mut board.piece_bb[color as usize][piece as usize];
            if *bb & !mask != 0 {
                *bb &= mask;
                return Some((color, piece));
            }
        }
    }
    None
}

/// Rights fall by observation, not by move bookkeeping: a king move drops
/// both rights of its color, and any rook home square found empty drops the
/// right it guards. This covers rook moves, rook captures and king moves in
/// one place, and a cleared right can never come back.
fn update_castling_rights(board: &mut Position, mover: Color, piece: Piece, keys: &ZobristKeys) {
    let old_rights = board.castling_rights;
    let mut rights = old_rights;

    if piece == Piece::King {
        rights &= match mover {
            Color::White => !(CASTLE_WK | CASTLE_WQ),
            Color::Black => !(CASTLE_BK | CASTLE_BQ),
        };
    }

    for (square, right, owner) in ROOK_HOME_SQUARES {
        if rights & right != 0 && !board.bb(owner, Piece::Rook).get_bit(square) {
            rights &= !right;
        }
    }

    if rights != old_rights {
        board.castling_rights = rights;
        xor_castling_rights_delta(&mut board.zobrist, keys, old_rights, rights);
    }
}

fn castle_rook_hop(
    board: &mut Position,
    color: Color,
    king_destination: u8,
    keys: &ZobristKeys,
) {
    let (rook_from, rook_to) = match king_destination {
        62 => (63, 61), // White O-O:   h1 -> f1
        58 => (56, 59), // White O-O-O: a1 -> d1
        6 => (7, 5),    // Black O-O:   h8 -> f8
        2 => (0, 3),    // Black O-O-O: a8 -> d8
        other => {
            error!(destination = other, "castling move with a bad king destination");
            return;
        }
    };

    let rooks = &mut board.piece_bb[color as usize][Piece::Rook as usize];
    rooks.clear_bit(rook_from);
    rooks.set_bit(rook_to);
    board.swap_position(color, Piece::Rook, rook_from, rook_to);
    board.zobrist ^= keys.piece[color as usize][Piece::Rook as usize][rook_from as usize];
    board.zobrist ^= keys.piece[color as usize][Piece::Rook as usize][rook_to as usize];
}

fn capture_en_passant(
    board: &mut Position,
    color: Color,
    destination: u8,
    keys: &ZobristKeys,
) {
    // The captured pawn sits behind the landing square.
    let captured_square = match color {
        Color::White => destination + 8,
        Color::Black => destination - 8,
    };
    let victim = color.opposite();
    board.piece_bb[victim as usize][Piece::Pawn as usize].clear_bit(captured_square);
    board.erase_position(victim, Piece::Pawn, captured_square);
    board.zobrist ^= keys.piece[victim as usize][Piece::Pawn as usize][captured_square as usize];
}

fn promote(
    board: &mut Position,
    color: Color,
    destination: u8,
    promoted: Piece,
    keys: &ZobristKeys,
) {
    board.piece_bb[color as usize][Piece::Pawn as usize].clear_bit(destination);
    board.erase_position(color, Piece::Pawn, destination);
    board.zobrist ^= keys.piece[color as usize][Piece::Pawn as usize][destination as usize];

    board.piece_bb[color as usize][promoted as usize].set_bit(destination);
    board.push_position(color, promoted, destination);
    board.zobrist ^= keys.piece[color as usize][promoted as usize][destination as usize];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::types::{FLAG_NONE, PROMO_QUEEN};
    use std::str::FromStr;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn mv(from: &str, to: &str, promotion: u8, flag: u8) -> Move {
        Move::new(sq(from), sq(to), promotion, flag)
    }

    #[test]
    fn quiet_move_updates_both_representations() {
        let mut board = Position::new();
        apply_move(&mut board, mv("g1", "f3", 0, FLAG_NONE));
        assert_eq!(
            board.piece_at(sq("f3")),
            Some((Color::White, Piece::Knight))
        );
        assert_eq!(board.piece_at(sq("g1")), None);
        assert_eq!(board.side_to_move, Color::Black);
        assert_eq!(board.half_move_count, 1);
        assert_eq!(board.zobrist, board.compute_zobrist_full());
    }

    #[test]
    fn double_push_sets_en_passant_behind_the_pawn() {
        let mut board = Position::new();
        apply_move(&mut board, mv("e2", "e4", 0, FLAG_NONE));
        assert_eq!(board.en_passant, Some(sq("e3")));
        apply_move(&mut board, mv("g8", "f6", 0, FLAG_NONE));
        assert_eq!(board.en_passant, None);
    }

    #[test]
    fn capture_purges_the_victim_everywhere() {
        let mut board =
            Position::from_str("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        apply_move(&mut board, mv("e4", "d5", 0, FLAG_NONE));
        assert_eq!(board.bb(Color::Black, Piece::Pawn), 0);
        assert!(board.piece_squares(Color::Black, Piece::Pawn).is_empty());
        assert_eq!(board.piece_at(sq("d5")), Some((Color::White, Piece::Pawn)));
        assert_eq!(board.zobrist, board.compute_zobrist_full());
    }

    #[test]
    fn en_passant_capture_removes_the_bypassed_pawn() {
        let mut board =
            Position::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        apply_move(&mut board, mv("e5", "d6", 0, FLAG_EN_PASSANT));
        assert_eq!(board.piece_at(sq("d6")), Some((Color::White, Piece::Pawn)));
        assert_eq!(board.piece_at(sq("d5")), None);
        assert_eq!(board.bb(Color::Black, Piece::Pawn), 0);
        assert_eq!(board.zobrist, board.compute_zobrist_full());
    }

    #[test]
    fn kingside_castle_hops_the_rook() {
        let mut board =
            Position::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        apply_move(&mut board, mv("e1", "g1", 0, FLAG_CASTLING));
        assert_eq!(board.piece_at(sq("g1")), Some((Color::White, Piece::King)));
        assert_eq!(board.piece_at(sq("f1")), Some((Color::White, Piece::Rook)));
        assert_eq!(board.piece_at(sq("h1")), None);
        assert!(!board.has_kingside_castle(Color::White));
        assert!(!board.has_queenside_castle(Color::White));
        assert!(board.has_kingside_castle(Color::Black));
        assert_eq!(board.zobrist, board.compute_zobrist_full());
    }

    #[test]
    fn rook_capture_drops_the_opponents_right() {
        let mut board =
            Position::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        apply_move(&mut board, mv("a1", "a8", 0, FLAG_NONE));
        assert!(!board.has_queenside_castle(Color::Black));
        assert!(!board.has_queenside_castle(Color::White));
        assert!(board.has_kingside_castle(Color::Black));
        assert_eq!(board.zobrist, board.compute_zobrist_full());
    }

    #[test]
    fn promotion_swaps_pawn_for_piece() {
        let mut board = Position::from_str("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        apply_move(&mut board, mv("a7", "a8", PROMO_QUEEN, FLAG_PROMOTION));
        assert_eq!(board.piece_at(sq("a8")), Some((Color::White, Piece::Queen)));
        assert_eq!(board.bb(Color::White, Piece::Pawn), 0);
        assert!(board.piece_squares(Color::White, Piece::Pawn).is_empty());
        assert_eq!(board.piece_squares(Color::White, Piece::Queen), &[0]);
        assert_eq!(board.zobrist, board.compute_zobrist_full());
    }

    #[test]
    fn empty_origin_is_a_no_op() {
        let mut board = Position::new();
        let before = board.clone();
        apply_move(&mut board, mv("e4", "e5", 0, FLAG_NONE));
        assert_eq!(board, before);
    }
}
