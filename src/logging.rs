use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

pub const LOG_FILE_NAME: &str = "cinenote.log";
const DEFAULT_FILTER: &str = "cinenote=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr. Used by the non-interactive commands.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to `<dir>/cinenote.log` so the terminal dialog is not drawn over.
///
/// Writes happen on a background thread. Keep the returned guard alive for
/// the whole session; dropping it flushes what is still queued.
pub fn init_file(dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}
