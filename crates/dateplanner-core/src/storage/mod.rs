mod config;
pub mod database;
pub mod identity;
mod kv;
pub mod state_store;

pub use config::{Config, StorageConfig, TimingConfig};
pub use database::Database;
pub use kv::{KeyValueStore, MemoryStore};
pub use state_store::{PersistedStateStore, SnapshotRejection, StorageKeys};

use std::path::PathBuf;

/// Returns the data directory.
///
/// `DATEPLANNER_DATA_DIR` wins if set; otherwise `~/.config/dateplanner[-dev]/`
/// based on `DATEPLANNER_ENV` (set it to `dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("DATEPLANNER_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("DATEPLANNER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("dateplanner-dev")
            } else {
                base_dir.join("dateplanner")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
