//! File logging.
//!
//! The terminal belongs to the TUI, so `tracing` output goes to
//! `<data_dir>/labelbar.log`. The filter comes from `RUST_LOG` and defaults to
//! `info`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber writing to `dir/labelbar.log`.
///
/// # Errors
///
/// Returns `Err` if the log file cannot be opened or a subscriber is already set.
pub fn init(dir: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("labelbar.log"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(std::io::Error::other)
}
