//! Diagnostic logging to a file.
//!
//! The terminal belongs to the chat UI, so tracing output only goes to the
//! file named by `--log`. Without it no subscriber is installed.

use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `debug` or
/// `casual_chat::mcp=trace`.
pub const LOG_ENV_VAR: &str = "CASUAL_CHAT_LOG";

const DEFAULT_FILTER: &str = "info";

pub fn init_file_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = open_log_file(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| -> Box<dyn Error> { err })?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Logging started");
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Open `path` for appending, creating it and its parent directories.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
