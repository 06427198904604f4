//! End-of-game classification. Only the outcomes decidable from "no legal
//! moves" are detected: checkmate and stalemate. Fifty-move, insufficient
//! material and formal threefold repetition are intentionally not tracked
//! here; a front end that wants them must keep its own counters.

use crate::board::Position;
use crate::moves::movegen::{MoveType, generate_legal_moves};
use crate::moves::square_control::is_king_in_check;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfGameType {
    None,
    Checkmate,
    Stalemate,
}

/// Classify the position for the side to move.
pub fn check_board_state(board: &Position) -> EndOfGameType {
    if !generate_legal_moves(board, MoveType::Normal).is_empty() {
        return EndOfGameType::None;
    }
    if is_king_in_check(board, board.side_to_move) {
        return EndOfGameType::Checkmate;
    }
    EndOfGameType::Stalemate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn fresh_game_is_undecided() {
        assert_eq!(check_board_state(&Position::new()), EndOfGameType::None);
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let board = Position::from_str(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3",
        )
        .unwrap();
        assert_eq!(check_board_state(&board), EndOfGameType::Checkmate);
    }

    #[test]
    fn cornered_but_unchecked_is_stalemate() {
        let board = Position::from_str("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(check_board_state(&board), EndOfGameType::Stalemate);
    }
}
