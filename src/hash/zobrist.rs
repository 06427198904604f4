//! Zobrist key tables. The generator is seeded with a fixed constant so the
//! same position always hashes to the same key across runs.

use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};

const ZOBRIST_SEED: u64 = 0x7C63_55A1_9E8D_42F1;

pub struct ZobristKeys {
    /// `[color][piece][square]` with White = 0, Black = 1 and P..K = 0..5.
    pub piece: [[[u64; 64]; 6]; 2],
    /// XORed into the key when Black is to move.
    pub side_to_move: u64,
    /// K, Q, k, q.
    pub castling: [u64; 4],
    /// One constant per file a..h; applied only while an en passant square
    /// is set.
    pub ep_file: [u64; 8],
}

/// Process-wide keys, generated once on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_keys(StdRng::seed_from_u64(ZOBRIST_SEED)))
}

/// XOR the castling constants for every right that differs between two
/// rights bitfields.
#[inline]
pub fn xor_castling_rights_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new: u8) {
    let delta = old ^ new;
    if delta & CASTLE_WK != 0 {
        *hash ^= keys.castling[0];
    }
    if delta & CASTLE_WQ != 0 {
        *hash ^= keys.castling[1];
    }
    if delta & CASTLE_BK != 0 {
        *hash ^= keys.castling[2];
    }
    if delta & CASTLE_BQ != 0 {
        *hash ^= keys.castling[3];
    }
}

fn generate_keys(mut rng: StdRng) -> ZobristKeys {
    // Zero keys would make a feature invisible to the hash.
    fn non_zero(rng: &mut StdRng) -> u64 {
        let mut value = rng.next_u64();
        while value == 0 {
            value = rng.next_u64();
        }
        value
    }

    let mut keys = ZobristKeys {
        piece: [[[0; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0; 4],
        ep_file: [0; 8],
    };

    for color in 0..2 {
        for piece in 0..6 {
            for square in 0..64 {
                keys.piece[color][piece][square] = non_zero(&mut rng);
            }
        }
    }
    for right in keys.castling.iter_mut() {
        *right = non_zero(&mut rng);
    }
    for file in keys.ep_file.iter_mut() {
        *file = non_zero(&mut rng);
    }
    keys.side_to_move = non_zero(&mut rng);

    keys
}
