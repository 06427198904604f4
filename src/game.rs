//! Game driver: owns the live position, a snapshot history for undo, and
//! the move list. Front ends push user moves through
//! [`GameState::update_board_state`]; the engine consumes the zobrist and
//! move histories it exposes.

use tracing::{debug, error, trace};

use crate::board::Position;
use crate::moves::execute::apply_move;
use crate::moves::movegen::is_legal_move;
use crate::moves::types::Move;
use crate::status::{EndOfGameType, check_board_state};

pub struct GameState {
    boards: Position,
    boards_history: Vec<Position>,
    moves_history: Vec<Move>,
}

impl GameState {
    /// Start from a FEN, or from the standard starting position. A bad FEN
    /// falls back to the starting position (logged by the parser).
    pub fn new(fen: Option<&str>) -> Self {
        let boards = match fen {
            Some(fen) => Position::from_fen(fen),
            None => Position::new(),
        };
        GameState {
            boards_history: vec![boards.clone()],
            boards,
            moves_history: Vec::new(),
        }
    }

    pub fn boards(&self) -> &Position {
        &self.boards
    }

    /// Validate and play a move. The caller may pass a bare
    /// (origin, destination, promotion) move; the legal-move lookup
    /// supplies the canonical castling and en passant flags. An illegal or
    /// malformed move leaves the state untouched and reports `None`.
    pub fn update_board_state(&mut self, mv: Move) -> EndOfGameType {
        if mv.origin() == mv.destination() {
            trace!(%mv, "origin and destination are the same");
            return EndOfGameType::None;
        }

        let Some((color, piece)) = self.boards.piece_at(mv.origin()) else {
            debug!(%mv, "no piece at the move origin");
            return EndOfGameType::None;
        };
        if color != self.boards.side_to_move {
            trace!(%mv, "piece of the wrong color");
            return EndOfGameType::None;
        }

        let Some(legal) = is_legal_move(&self.boards, mv, piece) else {
            trace!(%mv, "move is illegal");
            return EndOfGameType::None;
        };

        apply_move(&mut self.boards, legal);
        self.boards_history.push(self.boards.clone());
        self.moves_history.push(legal);

        check_board_state(&self.boards)
    }

    /// Step back one move. A no-op at the initial position.
    pub fn undo(&mut self) {
        if self.boards_history.len() <= 1 {
            return;
        }
        self.boards_history.pop();
        self.boards = self
            .boards_history
            .last()
            .expect("history always keeps the initial position")
            .clone();
        if self.moves_history.pop().is_none() {
            error!("moves history empty while position history was not");
        }
    }

    pub fn last_move(&self) -> Option<Move> {
        self.moves_history.last().copied()
    }

    pub fn moves_history(&self) -> &[Move] {
        &self.moves_history
    }

    /// Zobrist keys of every position seen so far, the search's repetition
    /// input.
    pub fn zobrist_key_history(&self) -> Vec<u64> {
        self.boards_history
            .iter()
            .map(|board| board.zobrist)
            .collect()
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::types::FLAG_NONE;
    use crate::square::Square;

    fn bare(from: &str, to: &str) -> Move {
        Move::new(
            Square::from_algebraic(from).unwrap(),
            Square::from_algebraic(to).unwrap(),
            0,
            FLAG_NONE,
        )
    }

    #[test]
    fn legal_moves_advance_the_game() {
        let mut game = GameState::new(None);
        assert_eq!(game.update_board_state(bare("e2", "e4")), EndOfGameType::None);
        assert_eq!(game.update_board_state(bare("e7", "e5")), EndOfGameType::None);
        assert_eq!(game.moves_history().len(), 2);
        assert_eq!(game.zobrist_key_history().len(), 3);
        assert_eq!(game.last_move(), Some(bare("e7", "e5")));
    }

    #[test]
    fn illegal_moves_are_rejected_without_mutation() {
        let mut game = GameState::new(None);
        let before = game.boards().clone();

        // from an empty square, with the wrong color, to an illegal square
        assert_eq!(game.update_board_state(bare("e4", "e5")), EndOfGameType::None);
        assert_eq!(game.update_board_state(bare("e7", "e5")), EndOfGameType::None);
        assert_eq!(game.update_board_state(bare("e2", "e5")), EndOfGameType::None);

        assert_eq!(game.boards(), &before);
        assert!(game.moves_history().is_empty());
    }

    #[test]
    fn undo_restores_the_previous_snapshot() {
        let mut game = GameState::new(None);
        let initial = game.boards().clone();

        game.update_board_state(bare("e2", "e4"));
        let after_first = game.boards().clone();
        game.update_board_state(bare("e7", "e5"));

        game.undo();
        assert_eq!(game.boards(), &after_first);
        game.undo();
        assert_eq!(game.boards(), &initial);
        // undoing past the start is a no-op
        game.undo();
        assert_eq!(game.boards(), &initial);
    }

    #[test]
    fn castling_through_the_driver_gets_the_flag() {
        let mut game =
            GameState::new(Some("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"));
        game.update_board_state(bare("e1", "g1"));
        let played = game.last_move().unwrap();
        assert!(played.is_castling());
    }

    #[test]
    fn scholars_mate_is_reported() {
        let mut game = GameState::new(None);
        for (from, to) in [
            ("e2", "e4"),
            ("e7", "e5"),
            ("f1", "c4"),
            ("b8", "c6"),
            ("d1", "h5"),
            ("g8", "f6"),
        ] {
            assert_eq!(game.update_board_state(bare(from, to)), EndOfGameType::None);
        }
        assert_eq!(
            game.update_board_state(bare("h5", "f7")),
            EndOfGameType::Checkmate
        );
    }
}
