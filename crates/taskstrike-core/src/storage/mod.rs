mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, Stats, TaskRecord, TodoItem};

use std::path::PathBuf;

/// Returns `~/.config/taskstrike[-dev]/` based on TASKSTRIKE_ENV.
///
/// `TASKSTRIKE_DATA_DIR` overrides the location entirely (used by tests).
/// Set `TASKSTRIKE_ENV=dev` to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> std::io::Result<PathBuf> {
    if let Ok(dir) = std::env::var("TASKSTRIKE_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKSTRIKE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("taskstrike-dev")
    } else {
        base_dir.join("taskstrike")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
