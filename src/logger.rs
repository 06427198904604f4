//! File logging for the CLI. The core library only emits `tracing` events;
//! installing a subscriber is the binary's business.

use std::path::Path;
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt};

static GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

/// Install a non-blocking file subscriber once for the whole process.
/// `filter` is a directive string like "skewer=debug"; the RUST_LOG
/// environment variable takes precedence when set.
pub fn init_logging<P: AsRef<Path>>(path: P, filter: &str) {
    INIT.get_or_init(|| {
        let path = path.as_ref();
        if let Some(directory) = path.parent() {
            let _ = std::fs::create_dir_all(directory);
        }

        let file = match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => file,
            Err(reason) => {
                eprintln!("cannot open log file {}: {reason}", path.display());
                return;
            }
        };

        let (writer, guard) = tracing_appender::non_blocking(file);
        // the guard must outlive the process or buffered lines are dropped
        let _ = GUARD.set(guard);

        let env_filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"))
        };

        let subscriber = fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .finish();

        // idempotent: a subscriber set elsewhere (tests) wins
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
