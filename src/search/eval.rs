//! Static evaluation: material, piece-square tables, a king pawn shield for
//! the middle game and a mop-up term for won endgames, all reported from
//! the side to move's perspective (negamax convention).

use crate::board::{Color, Piece, Position};
use crate::search::psqt;
use tracing::error;

pub const INFINITY: i32 = 1_000_000;
pub const MATE_SCORE: i32 = 100_000;
pub const NEGATIVE_MATE_SCORE: i32 = -MATE_SCORE;

const PAWN_VALUE: i32 = 100;
const KNIGHT_VALUE: i32 = 300;
const BISHOP_VALUE: i32 = 320;
const ROOK_VALUE: i32 = 500;
const QUEEN_VALUE: i32 = 900;

const SHIELD_PENALTY: i32 = 40;

/// Material worth of a piece; the king carries none.
pub fn figure_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

/// Manhattan distance of a square from the four center squares; 0 in the
/// center, 6 in the corners. Drives the mop-up term.
static CENTER_MANHATTAN_DISTANCE: [i32; 64] = build_center_manhattan();

const fn build_center_manhattan() -> [i32; 64] {
    let mut table = [0i32; 64];
    let mut square = 0usize;
    while square < 64 {
        let row = (square / 8) as i32;
        let file = (square % 8) as i32;
        let row_distance = if row <= 3 { 3 - row } else { row - 4 };
        let file_distance = if file <= 3 { 3 - file } else { file - 4 };
        table[square] = row_distance + file_distance;
        square += 1;
    }
    table
}

#[inline(always)]
fn manhattan_distance(a: u8, b: u8) -> i32 {
    ((a % 8) as i32 - (b % 8) as i32).abs() + ((a / 8) as i32 - (b / 8) as i32).abs()
}

/// Evaluate the position for the side to move.
pub fn evaluate(board: &Position) -> i32 {
    let weight = endgame_weight(board);

    let white_material = side_material(board, Color::White);
    let black_material = side_material(board, Color::Black);

    let mut evaluation = white_material - black_material;

    // Mop-up only matters once one side is clearly winning; it teaches the
    // stronger king to approach and the weaker king to be driven to a rim.
    if white_material > black_material + 2 * PAWN_VALUE {
        evaluation += mop_up(board, Color::White, weight);
    } else if black_material > white_material + 2 * PAWN_VALUE {
        evaluation -= mop_up(board, Color::Black, weight);
    }

    evaluation += piece_square_tables(board, weight);
    evaluation += king_pawn_shield(board, weight);

    match board.side_to_move {
        Color::White => evaluation,
        Color::Black => -evaluation,
    }
}

fn side_material(board: &Position, color: Color) -> i32 {
    let mut material = 0;
    for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        material += board.piece_squares(color, piece).len() as i32 * figure_value(piece);
    }
    material
}

/// 0 at full strength, approaching 1 as the non-pawn material of the poorer
/// side melts away below a rook, a bishop and two knights.
fn endgame_weight(board: &Position) -> f32 {
    let endgame_start = 1.0 / (ROOK_VALUE + BISHOP_VALUE + 2 * KNIGHT_VALUE) as f32;

    let non_pawn = |color: Color| -> i32 {
        board.piece_squares(color, Piece::Knight).len() as i32 * KNIGHT_VALUE
            + board.piece_squares(color, Piece::Bishop).len() as i32 * BISHOP_VALUE
            + board.piece_squares(color, Piece::Rook).len() as i32 * ROOK_VALUE
            + board.piece_squares(color, Piece::Queen).len() as i32 * QUEEN_VALUE
    };
    let material = non_pawn(Color::White).min(non_pawn(Color::Black));

    1.0 - (endgame_start * material as f32).min(1.0)
}

/// Reward (from the stronger side's viewpoint) for cornering the enemy king
/// and marching the own king toward it.
fn mop_up(board: &Position, stronger: Color, weight: f32) -> i32 {
    if weight.abs() < 0.01 {
        return 0;
    }

    let (Some(own_king), Some(enemy_king)) = (
        board.king_square(stronger),
        board.king_square(stronger.opposite()),
    ) else {
        error!("mop-up evaluation on a position without both kings");
        return 0;
    };

    let mut evaluation = 0;
    evaluation +=
        (1.6 * (14 - manhattan_distance(own_king.index(), enemy_king.index())) as f32) as i32;
    evaluation +=
        (4.7 * CENTER_MANHATTAN_DISTANCE[enemy_king.index() as usize] as f32) as i32;
    (weight * evaluation as f32) as i32
}

fn piece_square_tables(board: &Position, weight: f32) -> i32 {
    let mut evaluation = 0;

    let tables: [(&[i32; 64], Piece); 5] = [
        (&psqt::PAWN_SQUARE_VALUES, Piece::Pawn),
        (&psqt::KNIGHT_SQUARE_VALUES, Piece::Knight),
        (&psqt::BISHOP_SQUARE_VALUES, Piece::Bishop),
        (&psqt::ROOK_SQUARE_VALUES, Piece::Rook),
        (&psqt::QUEEN_SQUARE_VALUES, Piece::Queen),
    ];

    for (table, piece) in tables {
        for &square in board.piece_squares(Color::White, piece) {
            evaluation += table[square as usize];
        }
        for &square in board.piece_squares(Color::Black, piece) {
            evaluation -= table[63 - square as usize];
        }
    }

    let (Some(white_king), Some(black_king)) = (
        board.king_square(Color::White),
        board.king_square(Color::Black),
    ) else {
        error!("piece-square evaluation on a position without both kings");
        return 0;
    };

    let white_index = white_king.index() as usize;
    let black_index = 63 - black_king.index() as usize;
    evaluation += ((1.0 - weight)
        * psqt::KING_MIDDLE_GAME_SQUARE_VALUES[white_index] as f32) as i32
        + (weight * psqt::KING_END_GAME_SQUARE_VALUES[white_index] as f32) as i32;
    evaluation -= ((1.0 - weight)
        * psqt::KING_MIDDLE_GAME_SQUARE_VALUES[black_index] as f32) as i32
        + (weight * psqt::KING_END_GAME_SQUARE_VALUES[black_index] as f32) as i32;

    evaluation
}

/// Shield squares expected to hold a friendly pawn, per castled-king
/// position. Each element is an alternative mask: any set bit present in
/// the pawn board satisfies that element.
struct ShieldPattern {
    king_mask: u64,
    elements: &'static [u64],
}

// White king on g1/h1: f2, g2 or g3, h2 or h3.
const WHITE_KINGSIDE_SHIELD: ShieldPattern = ShieldPattern {
    king_mask: (1 << 62) | (1 << 63),
    elements: &[1 << 53, (1 << 54) | (1 << 46), (1 << 55) | (1 << 47)],
};
// White king on a1..c1: a2 or a3, b2, c2, d2.
const WHITE_QUEENSIDE_SHIELD: ShieldPattern = ShieldPattern {
    king_mask: (1 << 56) | (1 << 57) | (1 << 58),
    elements: &[(1 << 48) | (1 << 40), 1 << 49, 1 << 50, 1 << 51],
};
// Black king on g8/h8: f7, g7 or g6, h7 or h6.
const BLACK_KINGSIDE_SHIELD: ShieldPattern = ShieldPattern {
    king_mask: (1 << 6) | (1 << 7),
    elements: &[1 << 13, (1 << 14) | (1 << 22), (1 << 15) | (1 << 23)],
};
// Black king on a8..c8: a7 or a6, b7, c7, d7.
const BLACK_QUEENSIDE_SHIELD: ShieldPattern = ShieldPattern {
    king_mask: (1 << 0) | (1 << 1) | (1 << 2),
    elements: &[(1 << 8) | (1 << 16), 1 << 9, 1 << 10, 1 << 11],
};

/// Penalty for a castled king whose pawn shield has thinned out. Applies
/// only at full middle-game strength; in an endgame the king should leave
/// the shield anyway.
fn king_pawn_shield(board: &Position, weight: f32) -> i32 {
    if weight.abs() > 0.0 {
        return 0;
    }

    let missing = |pattern: &ShieldPattern, pawns: u64| -> i32 {
        pattern
            .elements
            .iter()
            .filter(|&&element| pawns & element == 0)
            .count() as i32
    };

    let mut evaluation = 0;

    let white_king = board.bb(Color::White, Piece::King);
    let white_pawns = board.bb(Color::White, Piece::Pawn);
    if white_king & WHITE_KINGSIDE_SHIELD.king_mask != 0 {
        evaluation -= SHIELD_PENALTY * missing(&WHITE_KINGSIDE_SHIELD, white_pawns);
    } else if white_king & WHITE_QUEENSIDE_SHIELD.king_mask != 0 {
        evaluation -= SHIELD_PENALTY * missing(&WHITE_QUEENSIDE_SHIELD, white_pawns);
    }

    let black_king = board.bb(Color::Black, Piece::King);
    let black_pawns = board.bb(Color::Black, Piece::Pawn);
    if black_king & BLACK_KINGSIDE_SHIELD.king_mask != 0 {
        evaluation += SHIELD_PENALTY * missing(&BLACK_KINGSIDE_SHIELD, black_pawns);
    } else if black_king & BLACK_QUEENSIDE_SHIELD.king_mask != 0 {
        evaluation += SHIELD_PENALTY * missing(&BLACK_QUEENSIDE_SHIELD, black_pawns);
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn start_position_is_balanced_for_both_sides() {
        let white_to_move = Position::new();
        assert_eq!(evaluate(&white_to_move), 0);

        let black_to_move =
            Position::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1")
                .unwrap();
        assert_eq!(evaluate(&black_to_move), 0);
    }

    #[test]
    fn evaluation_flips_sign_with_the_side_to_move() {
        let white_view =
            Position::from_str("4k3/8/8/8/8/8/8/QQQ1K3 w - - 0 1").unwrap();
        let black_view =
            Position::from_str("4k3/8/8/8/8/8/8/QQQ1K3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white_view), -evaluate(&black_view));
        assert!(evaluate(&white_view) > 0);
    }

    #[test]
    fn endgame_weight_spans_the_range() {
        assert_eq!(endgame_weight(&Position::new()), 0.0);
        let bare_kings = Position::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(endgame_weight(&bare_kings), 1.0);
    }

    #[test]
    fn mop_up_rewards_cornering_the_enemy_king() {
        // same material edge, enemy king in the corner vs the center
        let cornered =
            Position::from_str("7k/8/8/8/8/8/8/Q3K2R w - - 0 1").unwrap();
        let centered =
            Position::from_str("8/8/8/4k3/8/8/8/Q3K2R w - - 0 1").unwrap();
        assert!(evaluate(&cornered) > evaluate(&centered));
    }

    #[test]
    fn missing_shield_pawns_cost_forty_each() {
        // both kings castled short; White's g2 pawn is gone
        let intact = Position::from_str(
            "rnbq1rk1/pppppppp/8/8/8/8/PPPPPPPP/RNBQ1RK1 w - - 0 1",
        )
        .unwrap();
        let thinned = Position::from_str(
            "rnbq1rk1/pppppppp/8/8/8/8/PPPPPP1P/RNBQ1RK1 w - - 0 1",
        )
        .unwrap();
        let intact_eval = evaluate(&intact);
        let thinned_eval = evaluate(&thinned);
        assert_eq!(intact_eval, 0);
        // losing the pawn costs material plus one shield element
        assert_eq!(thinned_eval, -PAWN_VALUE - SHIELD_PENALTY - 10);
    }

    #[test]
    fn center_manhattan_table_shape() {
        assert_eq!(CENTER_MANHATTAN_DISTANCE[0], 6); // a8
        assert_eq!(CENTER_MANHATTAN_DISTANCE[63], 6); // h1
        assert_eq!(CENTER_MANHATTAN_DISTANCE[35], 0); // d4..e5 block
        assert_eq!(CENTER_MANHATTAN_DISTANCE[36], 0);
    }
}
