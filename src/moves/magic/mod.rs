pub mod attacks;
pub mod loader;
pub mod precompute;
pub mod structs;

pub use structs::MagicTables;

use once_cell::sync::OnceCell;

/// Process-wide sliding-attack tables, built once on first use and
/// immutable afterwards.
pub fn magic_tables() -> &'static MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(loader::load_magic_tables)
}
