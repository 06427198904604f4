//! Table construction entry point. By default tables are regenerated from
//! the fixed seed at startup; the `load_magic` feature adds a bincode cache
//! on disk so repeated short-lived runs skip the search.

use super::precompute::{MagicTableSeed, generate_magic_tables};
use super::structs::MagicTables;

const MAGIC_SEED: u64 = 0x1D87_2B41_66FC_9A35;

#[cfg(feature = "load_magic")]
const CACHE_PATH: &str = "magic_tables.bin";

pub fn load_magic_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    if let Some(tables) = read_cache() {
        return tables;
    }

    let tables = generate_magic_tables(MagicTableSeed::Fixed(MAGIC_SEED))
        .unwrap_or_else(|reason| panic!("magic table generation failed: {reason}"));

    #[cfg(feature = "load_magic")]
    write_cache(&tables);

    tables
}

#[cfg(feature = "load_magic")]
fn read_cache() -> Option<MagicTables> {
    let bytes = std::fs::read(CACHE_PATH).ok()?;
    match bincode::deserialize(&bytes) {
        Ok(tables) => Some(tables),
        Err(reason) => {
            tracing::warn!(%reason, "ignoring unreadable magic table cache");
            None
        }
    }
}

#[cfg(feature = "load_magic")]
fn write_cache(tables: &MagicTables) {
    let encoded = match bincode::serialize(tables) {
        Ok(encoded) => encoded,
        Err(reason) => {
            tracing::warn!(%reason, "failed to encode magic table cache");
            return;
        }
    };
    if let Err(reason) = std::fs::write(CACHE_PATH, encoded) {
        tracing::warn!(%reason, "failed to write magic table cache");
    }
}
