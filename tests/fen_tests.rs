use std::str::FromStr;

use skewer::board::{Position, START_FEN};

fn leading_fields(fen: &str) -> Vec<String> {
    fen.split_whitespace().take(4).map(str::to_string).collect()
}

#[test]
fn four_leading_fields_round_trip() {
    let fens = [
        START_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnbqkbnr/ppp1p1pp/5p2/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 11",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
        "r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1",
    ];
    for fen in fens {
        let board = Position::from_str(fen).expect("FEN must parse");
        assert_eq!(leading_fields(&board.to_fen()), leading_fields(fen), "{fen}");
    }
}

#[test]
fn malformed_fens_fall_back_to_the_start_position() {
    let bad = [
        "",
        "banana",
        // seven rows
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
        // a row covering nine files
        "rnbqkbnr/ppppppppp/8/8/8/8/8/PPPPPPPP w KQkq - 0 1",
        // unknown glyph
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1",
        // bad active color
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
        // bad castling glyph
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KX - 0 1",
        // en passant on the wrong rank
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e5 0 1",
        // missing fields
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq",
        // no white king
        "rnbq1bnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w - - 0 1",
        // two black kings
        "rnbqkknr/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1BNR w - - 0 1",
    ];
    let start = Position::new();
    for fen in bad {
        assert!(Position::from_str(fen).is_err(), "{fen:?} should not parse");
        assert_eq!(Position::from_fen(fen), start, "{fen:?} should fall back");
    }
}

#[test]
fn ply_counter_starts_at_zero_regardless_of_fen_clocks() {
    let board =
        Position::from_str("4k3/8/8/8/8/8/8/4K3 w - - 37 99").unwrap();
    assert_eq!(board.half_move_count, 0);
}
