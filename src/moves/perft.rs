//! Perft: count the legal move tree's leaves at a fixed depth. The numbers
//! for standard positions are well known, which makes this the canonical
//! regression harness for the generator and for move application.

use arrayvec::ArrayVec;
use tracing::debug;

use crate::board::Position;
use crate::moves::execute::applied;
use crate::moves::movegen::{MoveType, generate_legal_moves_into};
use crate::moves::types::Move;

/// Upper bound on legal moves in any reachable position.
type NodeMoves = ArrayVec<Move, 256>;

/// Number of leaves at exactly `depth` plies below `board`.
pub fn perft(board: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = NodeMoves::new();
    generate_legal_moves_into(board, MoveType::Normal, &mut moves);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for &mv in moves.iter() {
        nodes += perft(&applied(board, mv), depth - 1);
    }
    nodes
}

/// Per-root-move subtotals, in generation order, plus the grand total.
/// The workhorse behind the CLI's `perft` command.
pub fn perft_divide(board: &Position, depth: u32) -> (Vec<(Move, u64)>, u64) {
    let mut moves = NodeMoves::new();
    generate_legal_moves_into(board, MoveType::Normal, &mut moves);
    debug!(depth, root_moves = moves.len(), "perft divide");

    let mut results = Vec::with_capacity(moves.len());
    let mut total = 0;
    for &mv in moves.iter() {
        let nodes = if depth <= 1 {
            1
        } else {
            perft(&applied(board, mv), depth - 1)
        };
        debug!(%mv, nodes, "perft divide subtotal");
        results.push((mv, nodes));
        total += nodes;
    }
    (results, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shallow_start_position_counts() {
        let board = Position::new();
        assert_eq!(perft(&board, 0), 1);
        assert_eq!(perft(&board, 1), 20);
        assert_eq!(perft(&board, 2), 400);
    }

    #[test]
    fn divide_subtotals_sum_to_perft() {
        let board = Position::new();
        let (results, total) = perft_divide(&board, 2);
        assert_eq!(results.len(), 20);
        assert_eq!(total, perft(&board, 2));
        assert_eq!(results.iter().map(|(_, n)| n).sum::<u64>(), total);
    }
}
