use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("chatlayout").join("chatlayout.log"))
}

fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "chatlayout=debug" } else { "chatlayout=info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. The terminal belongs to the UI, so logs go
/// to a file unless `to_stderr` is set. Returns the log file, if any.
pub fn init(verbose: bool, to_stderr: bool) -> Result<Option<PathBuf>> {
    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter(verbose))
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let Some(path) = log_file_path() else {
        tracing_subscriber::fmt()
            .with_env_filter(filter(verbose))
            .with_writer(std::io::sink)
            .init();
        return Ok(None);
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(Some(path))
}
