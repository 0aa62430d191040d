mod config;
pub mod database;

pub use config::{ApiConfig, CertificateConfig, Config, StoreConfig, SyncConfig};
pub use database::DataBase;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/search-ads[-dev]/` based on SEARCH_ADS_ENV.
///
/// Set SEARCH_ADS_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SEARCH_ADS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("search-ads-dev")
    } else {
        base_dir.join("search-ads")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
