//! Fully legal move generation. Candidate moves for non-king pieces are
//! vetted by applying them to a scratch copy and testing the mover's king;
//! king steps are restricted up front by the enemy attacked-set computed
//! with the king lifted off the board, which accounts for x-ray attacks
//! through the king.

use crate::bitboard::BitboardExt;
use crate::board::{Color, Piece, Position};
use crate::moves::execute::applied;
use crate::moves::king::{
    BLACK_KINGSIDE_CASTLE_MASK, BLACK_QUEENSIDE_ATTACKED_MASK, BLACK_QUEENSIDE_PIECES_MASK,
    KING_ATTACKS, WHITE_KINGSIDE_CASTLE_MASK, WHITE_QUEENSIDE_ATTACKED_MASK,
    WHITE_QUEENSIDE_PIECES_MASK,
};
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::magic_tables;
use crate::moves::pawn::{
    double_push_jumped_square, pawn_attacks, pawn_double_pushes, pawn_ep_targets, pawn_pushes,
};
use crate::moves::square_control::{attacked_squares, is_king_in_check};
use crate::moves::types::{
    FLAG_CASTLING, FLAG_EN_PASSANT, FLAG_NONE, FLAG_PROMOTION, Move, MoveBuffer,
};
use crate::square::Square;
use crate::utils::pop_lsb;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveType {
    /// Every legal move.
    Normal,
    /// Captures, promotions and en passant only; used by quiescence.
    Capture,
}

/// All legal moves for the side to move.
pub fn generate_legal_moves(board: &Position, move_type: MoveType) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    generate_legal_moves_into(board, move_type, &mut moves);
    moves
}

pub fn generate_legal_moves_into(
    board: &Position,
    move_type: MoveType,
    moves: &mut impl MoveBuffer,
) {
    moves.clear();
    let color = board.side_to_move;

    if board.king_square(Color::White).is_none() || board.king_square(Color::Black).is_none() {
        error!("cannot generate moves for a position without both kings");
        return;
    }

    for &origin in board.piece_squares(color, Piece::Pawn) {
        pawn_moves(board, origin, move_type, moves);
    }
    for &origin in board.piece_squares(color, Piece::Bishop) {
        slider_moves(board, origin, Piece::Bishop, move_type, moves);
    }
    for &origin in board.piece_squares(color, Piece::Rook) {
        slider_moves(board, origin, Piece::Rook, move_type, moves);
    }
    for &origin in board.piece_squares(color, Piece::Knight) {
        knight_moves(board, origin, move_type, moves);
    }
    for &origin in board.piece_squares(color, Piece::Queen) {
        slider_moves(board, origin, Piece::Queen, move_type, moves);
    }

    let king_origin = board.piece_squares(color, Piece::King)[0];
    king_moves(
        board,
        king_origin,
        move_type,
        is_king_in_check(board, color),
        moves,
    );
}

/// Legal moves of one piece standing on `origin`. Backbone of
/// [`is_legal_move`]; the aggregate generator goes through the same
/// per-piece functions.
pub fn generate_moves_from(
    board: &Position,
    piece: Piece,
    origin: u8,
    move_type: MoveType,
) -> Vec<Move> {
    let mut moves = Vec::with_capacity(16);
    match piece {
        Piece::Pawn => pawn_moves(board, origin, move_type, &mut moves),
        Piece::Knight => knight_moves(board, origin, move_type, &mut moves),
        Piece::Bishop | Piece::Rook | Piece::Queen => {
            slider_moves(board, origin, piece, move_type, &mut moves)
        }
        Piece::King => king_moves(
            board,
            origin,
            move_type,
            is_king_in_check(board, board.side_to_move),
            &mut moves,
        ),
    }
    moves
}

/// Match a bare (origin, destination, promotion) move against the legal
/// moves of `piece` and hand back the generated move, which carries the
/// canonical castling or en passant flag. Loose equality keeps each
/// promotion choice distinct.
pub fn is_legal_move(board: &Position, mv: Move, piece: Piece) -> Option<Move> {
    generate_moves_from(board, piece, mv.origin().index(), MoveType::Normal)
        .into_iter()
        .find(|generated| mv.loose_eq(*generated))
}

/// Keep the candidate only if the mover's king survives it.
fn append_if_no_check(board: &Position, mv: Move, moves: &mut impl MoveBuffer) {
    let next = applied(board, mv);
    if !is_king_in_check(&next, board.side_to_move) {
        moves.push(mv);
    }
}

fn pawn_moves(board: &Position, origin: u8, move_type: MoveType, moves: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let all_pieces = board.occupied();

    let legal_attacks = pawn_attacks(origin, color) & board.opponent_occupancy(color);

    let (single_pushes, double_pushes) = match move_type {
        MoveType::Normal => {
            let single = pawn_pushes(origin, color) & !all_pieces;
            let double = if all_pieces & double_push_jumped_square(origin, color) == 0 {
                pawn_double_pushes(origin, color) & !all_pieces
            } else {
                0
            };
            (single, double)
        }
        MoveType::Capture => (0, 0),
    };

    // Row 1 (White) / row 6 (Black) is one step from promotion.
    let promoting = match color {
        Color::White => origin / 8 == 1,
        Color::Black => origin / 8 == 6,
    };

    let from = Square::from_index(origin);
    let mut targets =
        (legal_attacks | single_pushes | double_pushes) & !board.occupancy(color);
    while targets != 0 {
        let to = Square::from_index(pop_lsb(&mut targets));
        if promoting {
            for promotion in 0..4u8 {
                append_if_no_check(board, Move::new(from, to, promotion, FLAG_PROMOTION), moves);
            }
        } else {
            append_if_no_check(board, Move::new(from, to, 0, FLAG_NONE), moves);
        }
    }

    if let Some(ep) = board.en_passant {
        if pawn_ep_targets(origin, color) & (1u64 << ep.index()) != 0 {
            append_if_no_check(board, Move::new(from, ep, 0, FLAG_EN_PASSANT), moves);
        }
    }
}

fn knight_moves(board: &Position, origin: u8, move_type: MoveType, moves: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let available = match move_type {
        MoveType::Normal => !board.occupancy(color),
        MoveType::Capture => board.opponent_occupancy(color),
    };

    let from = Square::from_index(origin);
    let mut targets = KNIGHT_ATTACKS[origin as usize] & available;
    while targets != 0 {
        let to = Square::from_index(pop_lsb(&mut targets));
        append_if_no_check(board, Move::new(from, to, 0, FLAG_NONE), moves);
    }
}

fn slider_moves(
    board: &Position,
    origin: u8,
    piece: Piece,
    move_type: MoveType,
    moves: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let tables = magic_tables();
    let occupied = board.occupied();

    let attacks = match piece {
        Piece::Bishop => tables.bishop.get_attacks(origin as usize, occupied),
        Piece::Rook => tables.rook.get_attacks(origin as usize, occupied),
        _ => tables.queen_attacks(origin as usize, occupied),
    };
    let available = match move_type {
        MoveType::Normal => !board.occupancy(color),
        MoveType::Capture => board.opponent_occupancy(color),
    };

    let from = Square::from_index(origin);
    let mut targets = attacks & available;
    while targets != 0 {
        let to = Square::from_index(pop_lsb(&mut targets));
        append_if_no_check(board, Move::new(from, to, 0, FLAG_NONE), moves);
    }
}

fn king_moves(
    board: &Position,
    origin: u8,
    move_type: MoveType,
    king_in_check: bool,
    moves: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;

    // Lift the king off the board so enemy sliders attack through its
    // square; otherwise stepping away along a checking ray would look safe.
    // The stale position list is harmless: attack computation reads the
    // enemy lists and the occupancy bitboards only.
    let mut without_king = board.clone();
    without_king.piece_bb[color as usize][Piece::King as usize].clear_bit(origin);
    let enemy_attacks = attacked_squares(&without_king, color.opposite());

    let available = match move_type {
        MoveType::Normal => !board.occupancy(color),
        MoveType::Capture => board.opponent_occupancy(color),
    };

    let from = Square::from_index(origin);
    let mut targets = KING_ATTACKS[origin as usize] & available & !enemy_attacks;
    while targets != 0 {
        let to = Square::from_index(pop_lsb(&mut targets));
        moves.push(Move::new(from, to, 0, FLAG_NONE));
    }

    // Castling never captures and is illegal out of check.
    if move_type == MoveType::Capture || king_in_check {
        return;
    }

    let all_pieces = board.occupied();
    let (kingside_ok, queenside_ok, kingside_to, queenside_to) = match color {
        Color::White => (
            board.has_kingside_castle(color)
                && WHITE_KINGSIDE_CASTLE_MASK & (enemy_attacks | all_pieces) == 0,
            board.has_queenside_castle(color)
                && WHITE_QUEENSIDE_ATTACKED_MASK & enemy_attacks == 0
                && WHITE_QUEENSIDE_PIECES_MASK & all_pieces == 0,
            62,
            58,
        ),
        Color::Black => (
            board.has_kingside_castle(color)
                && BLACK_KINGSIDE_CASTLE_MASK & (enemy_attacks | all_pieces) == 0,
            board.has_queenside_castle(color)
                && BLACK_QUEENSIDE_ATTACKED_MASK & enemy_attacks == 0
                && BLACK_QUEENSIDE_PIECES_MASK & all_pieces == 0,
            6,
            2,
        ),
    };

    if kingside_ok {
        moves.push(Move::new(from, Square::from_index(kingside_to), 0, FLAG_CASTLING));
    }
    if queenside_ok {
        moves.push(Move::new(from, Square::from_index(queenside_to), 0, FLAG_CASTLING));
    }
}
