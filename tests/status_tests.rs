use std::str::FromStr;

use skewer::board::Position;
use skewer::status::{EndOfGameType, check_board_state};

fn status_of(fen: &str) -> EndOfGameType {
    check_board_state(&Position::from_str(fen).expect("test FEN must parse"))
}

#[test]
fn ongoing_positions_report_none() {
    assert_eq!(check_board_state(&Position::new()), EndOfGameType::None);
    assert_eq!(
        status_of("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
        EndOfGameType::None
    );
}

#[test]
fn checkmates_are_detected() {
    // fool's mate
    assert_eq!(
        status_of("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3"),
        EndOfGameType::Checkmate
    );
    // back-rank mate
    assert_eq!(
        status_of("R5k1/5ppp/8/8/8/8/8/4K3 b - - 0 1"),
        EndOfGameType::Checkmate
    );
    // smothered mate
    assert_eq!(
        status_of("6rk/5Npp/8/8/8/8/8/4K3 b - - 0 1"),
        EndOfGameType::Checkmate
    );
}

#[test]
fn stalemates_are_detected() {
    assert_eq!(
        status_of("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"),
        EndOfGameType::Stalemate
    );
    assert_eq!(
        status_of("k7/P7/K7/8/8/8/8/8 b - - 0 1"),
        EndOfGameType::Stalemate
    );
}

#[test]
fn check_with_an_escape_is_not_mate() {
    // the queen gives check but the king can step aside
    assert_eq!(
        status_of("4k3/4Q3/8/8/8/8/8/4K3 b - - 0 1"),
        EndOfGameType::None
    );
}
