//! Move ordering. Searching the likely-best move first is what makes
//! alpha-beta prune; the heuristics are the hash move from an earlier
//! search of the same position, MVV-LVA for captures, and the value of the
//! promoted piece for promotions.

use crate::board::{Piece, Position};
use crate::moves::pawn::pawn_attacks;
use crate::moves::types::Move;
use crate::search::eval::figure_value;
use tracing::error;

const HASH_MOVE_SCORE: i32 = 100_000;

/// Penalizing destinations guarded by enemy pawns ranked slightly better in
/// play but cost more time than the pruning gained; kept switched off.
const SCORE_PAWN_GUARDED_DESTINATIONS: bool = false;

/// Sort moves best-first. The sort is stable, so equal scores keep their
/// generation order.
pub fn order_moves(moves: Vec<Move>, board: &Position, hash_move: Move) -> Vec<Move> {
    let mut scored: Vec<(i32, Move)> = Vec::with_capacity(moves.len());

    for mv in moves {
        if !hash_move.is_null() && mv == hash_move {
            scored.push((HASH_MOVE_SCORE, mv));
            continue;
        }

        let Some((_, moving_piece)) = board.piece_at(mv.origin()) else {
            error!(%mv, "ordering a move with no piece at its origin");
            continue;
        };

        let mut score = 0;

        // MVV-LVA: prefer grabbing the biggest victim with the smallest
        // attacker. En passant destinations are empty and score as quiet
        // moves here.
        if let Some((_, captured_piece)) = board.piece_at(mv.destination()) {
            score = figure_value(captured_piece) - figure_value(moving_piece);
        }

        if mv.is_promotion() {
            score += figure_value(mv.promotion_piece());
        }

        if SCORE_PAWN_GUARDED_DESTINATIONS
            && enemy_pawns_attack(board, mv.destination().index())
        {
            score -= figure_value(moving_piece);
        }

        scored.push((score, mv));
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, mv)| mv).collect()
}

fn enemy_pawns_attack(board: &Position, destination: u8) -> bool {
    let enemy = board.side_to_move.opposite();
    let mut attacks = 0u64;
    for &square in board.piece_squares(enemy, Piece::Pawn) {
        attacks |= pawn_attacks(square, enemy);
    }
    attacks & (1u64 << destination) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::movegen::{MoveType, generate_legal_moves};
    use crate::moves::types::{FLAG_NONE, FLAG_PROMOTION, PROMO_KNIGHT, PROMO_QUEEN};
    use crate::square::Square;
    use std::str::FromStr;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn hash_move_comes_first() {
        let board = Position::new();
        let moves = generate_legal_moves(&board, MoveType::Normal);
        let hash_move = Move::new(sq("d2"), sq("d4"), 0, FLAG_NONE);
        let ordered = order_moves(moves, &board, hash_move);
        assert_eq!(ordered[0], hash_move);
    }

    #[test]
    fn juicier_victims_sort_earlier() {
        // the d5 pawn can take either the c6 queen or the e6 rook
        let board =
            Position::from_str("4k3/8/2q1r3/3P4/8/8/8/3K4 w - - 0 1").unwrap();
        let moves = generate_legal_moves(&board, MoveType::Capture);
        let ordered = order_moves(moves, &board, Move::NULL);
        assert_eq!(ordered[0].destination(), sq("c6"));
        assert_eq!(ordered[1].destination(), sq("e6"));
    }

    #[test]
    fn promotions_rank_by_promoted_piece() {
        let board = Position::from_str("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let moves = generate_legal_moves(&board, MoveType::Normal);
        let ordered = order_moves(moves, &board, Move::NULL);
        assert_eq!(
            ordered[0],
            Move::new(sq("a7"), sq("a8"), PROMO_QUEEN, FLAG_PROMOTION)
        );
        // the knight underpromotion still outranks every quiet king move
        assert!(
            ordered
                .iter()
                .position(|m| m.promotion_code() == PROMO_KNIGHT && m.is_promotion())
                .unwrap()
                < ordered.iter().position(|m| !m.is_promotion()).unwrap()
        );
    }

    #[test]
    fn quiet_ties_keep_generation_order() {
        let board = Position::new();
        let moves = generate_legal_moves(&board, MoveType::Normal);
        let ordered = order_moves(moves.clone(), &board, Move::NULL);
        assert_eq!(ordered, moves);
    }
}
