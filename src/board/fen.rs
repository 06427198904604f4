//! FEN ingest and serialization.
//!
//! The placement field reads rank 8 first, which matches the board's
//! top-left-first square indexing directly: FEN row r, file f lands on
//! square index `r * 8 + f`.

use super::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece, Position};
use crate::bitboard::BitboardExt;
use crate::square::Square;

fn piece_from_glyph(glyph: char) -> Option<(Color, Piece)> {
    let color = if glyph.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let piece = match glyph.to_ascii_lowercase() {
        'p' => Piece::Pawn,
        'n' => Piece::Knight,
        'b' => Piece::Bishop,
        'r' => Piece::Rook,
        'q' => Piece::Queen,
        'k' => Piece::King,
        _ => return None,
    };
    Some((color, piece))
}

fn glyph_for_piece(color: Color, piece: Piece) -> char {
    let glyph = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => glyph.to_ascii_uppercase(),
        Color::Black => glyph,
    }
}

impl Position {
    /// Load a position from a six-field FEN string. On error the board is
    /// left cleared and the caller decides the fallback.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        *self = Position::new_empty();

        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(format!(
                "FEN must have 6 space-separated fields, found {}",
                fields.len()
            ));
        }

        self.parse_placement(fields[0])?;
        self.parse_active_color(fields[1])?;
        self.parse_castling_rights(fields[2])?;
        self.parse_en_passant(fields[3])?;
        // Fields 5 and 6 (half-move clock, full-move number) are accepted
        // but not used; the ply counter starts at zero on load.

        if self.bb(Color::White, Piece::King).count_ones() != 1
            || self.bb(Color::Black, Piece::King).count_ones() != 1
        {
            return Err("each side must have exactly one king".to_string());
        }

        self.rebuild_position_lists();
        self.refresh_zobrist();
        Ok(())
    }

    fn parse_placement(&mut self, placement: &str) -> Result<(), String> {
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err("placement must have 8 rows separated by '/'".to_string());
        }

        for (row_index, row) in rows.iter().enumerate() {
            let mut file = 0u8;
            for glyph in row.chars() {
                if let Some(skip) = glyph.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(format!("placement digit '{glyph}' out of range"));
                    }
                    file += skip as u8;
                } else {
                    let (color, piece) = piece_from_glyph(glyph)
                        .ok_or_else(|| format!("unknown placement glyph '{glyph}'"))?;
                    if file > 7 {
                        return Err(format!("placement row {} overflows", row_index + 1));
                    }
                    self.piece_bb[color as usize][piece as usize]
                        .set_bit(row_index as u8 * 8 + file);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(format!("placement row {} does not cover 8 files", row_index + 1));
            }
        }
        Ok(())
    }

    fn parse_active_color(&mut self, field: &str) -> Result<(), String> {
        self.side_to_move = match field {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("active color must be 'w' or 'b', found '{other}'")),
        };
        Ok(())
    }

    fn parse_castling_rights(&mut self, field: &str) -> Result<(), String> {
        self.castling_rights = 0;
        if field == "-" {
            return Ok(());
        }
        for glyph in field.chars() {
            self.castling_rights |= match glyph {
                'K' => CASTLE_WK,
                'Q' => CASTLE_WQ,
                'k' => CASTLE_BK,
                'q' => CASTLE_BQ,
                other => return Err(format!("unknown castling glyph '{other}'")),
            };
        }
        Ok(())
    }

    fn parse_en_passant(&mut self, field: &str) -> Result<(), String> {
        if field == "-" {
            self.en_passant = None;
            return Ok(());
        }
        let square = Square::from_algebraic(field)?;
        if square.rank_digit() != 3 && square.rank_digit() != 6 {
            return Err(format!("en passant square '{field}' must be on rank 3 or 6"));
        }
        self.en_passant = Some(square);
        Ok(())
    }

    /// Serialize back to FEN. The half-move clock is written as zero; the
    /// full-move number is derived from the ply counter.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for row in 0..8u8 {
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                match self.piece_at(Square::from_index(row * 8 + file)) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            fen.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        fen.push(glyph_for_piece(color, piece));
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push((b'0' + empty_run) as char);
            }
            if row != 7 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            if self.castling_rights & CASTLE_WK != 0 {
                fen.push('K');
            }
            if self.castling_rights & CASTLE_WQ != 0 {
                fen.push('Q');
            }
            if self.castling_rights & CASTLE_BK != 0 {
                fen.push('k');
            }
            if self.castling_rights & CASTLE_BQ != 0 {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.en_passant {
            Some(square) => fen.push_str(&square.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" 0 {}", 1 + self.half_move_count / 2));
        fen
    }
}
