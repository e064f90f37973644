mod config;
pub mod database;
mod keys;

pub use config::{
    Config, NotificationsConfig, ProfileConfig, SessionConfig, SurprisesConfig,
    MAX_SURPRISE_MULTIPLIER,
};
pub use database::Database;
pub use keys::StorageKey;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/study-buddy[-dev]/` based on STUDY_BUDDY_ENV.
///
/// Set STUDY_BUDDY_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDY_BUDDY_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("study-buddy-dev")
    } else {
        base_dir.join("study-buddy")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
