//! Magic number search and table construction. A candidate magic maps every
//! relevant blocker subset of a square to a table slot; a candidate is kept
//! when no two subsets with different attack sets collide.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::attacks::{
    bishop_attacks_per_square, bishop_mask, rook_attacks_per_square, rook_mask,
};
use super::structs::{MagicEntry, MagicTables, SliderTable};

const MAX_ATTEMPTS: u32 = 1_000_000;

#[derive(Debug, Clone, Copy)]
pub enum MagicTableSeed {
    /// Reproducible tables; used for the process-wide instance.
    Fixed(u64),
    FromEntropy,
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = match seed {
        MagicTableSeed::Fixed(seed) => StdRng::seed_from_u64(seed),
        MagicTableSeed::FromEntropy => {
            let mut seed = [0u8; 32];
            rand::rng().fill_bytes(&mut seed);
            StdRng::from_seed(seed)
        }
    };

    let rook = build_slider_table(&mut rng, rook_mask, rook_attacks_per_square)?;
    let bishop = build_slider_table(&mut rng, bishop_mask, bishop_attacks_per_square)?;
    Ok(MagicTables { rook, bishop })
}

fn build_slider_table(
    rng: &mut StdRng,
    mask_of: fn(usize) -> u64,
    attacks_of: fn(usize, u64) -> u64,
) -> Result<SliderTable, String> {
    let mut entries = Vec::with_capacity(64);
    for square in 0..64 {
        let mask = mask_of(square);
        let blockers = enumerate_subsets(mask);
        let attacks: Vec<u64> = blockers.iter().map(|&b| attacks_of(square, b)).collect();
        let shift = 64 - mask.count_ones();
        let (magic, table) = find_magic_for_square(&blockers, &attacks, shift, rng)
            .map_err(|e| format!("square {square}: {e}"))?;
        entries.push(MagicEntry {
            magic,
            shift,
            mask,
            table,
        });
    }
    Ok(SliderTable { entries })
}

/// All subsets of a mask via the carry-rippler trick.
fn enumerate_subsets(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

/// Sparse candidates collide far less often in the multiply-shift hash.
#[inline]
fn random_sparse_u64(rng: &mut StdRng) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// Try candidates until one fills the table without a destructive
/// collision; two subsets may share a slot only when their attack sets are
/// identical.
fn find_magic_for_square(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut StdRng,
) -> Result<(u64, Box<[u64]>), String> {
    let table_len = 1usize << (64 - shift);
    // A slider always attacks at least one square, so 0 marks an empty slot.
    let mut table = vec![0u64; table_len];

    'candidates: for _ in 0..MAX_ATTEMPTS {
        let magic = random_sparse_u64(rng);
        table.fill(0);

        for (&blocker, &attack) in blockers.iter().zip(attacks) {
            let index = (blocker.wrapping_mul(magic) >> shift) as usize;
            if table[index] == 0 {
                table[index] = attack;
            } else if table[index] != attack {
                continue 'candidates;
            }
        }
        return Ok((magic, table.into_boxed_slice()));
    }
    Err(format!("no valid magic found in {MAX_ATTEMPTS} attempts"))
}
