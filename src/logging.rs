use anyhow::{anyhow, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "docchat.log";

/// Where log records go: the terminal is owned by the TUI.
pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("docchat"))
}

pub fn open_log_file(dir: &Path) -> Result<File> {
    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))?;
    Ok(file)
}

/// Install the global subscriber writing to the log file.
/// Returns the file path so the UI can point at it.
pub fn init(filter: &str) -> Result<PathBuf> {
    let dir = log_dir()?;
    let file = open_log_file(&dir)?;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(dir.join(LOG_FILE_NAME))
}
