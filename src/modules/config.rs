use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const CONFIG_FILE: &str = "config.json";

/// Application data directory (`<local data>/resource-proxy`)
pub fn get_data_dir() -> AppResult<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| AppError::Config("Failed to locate local data directory".to_string()))?;
    Ok(base.join("resource-proxy"))
}

/// Default config location inside the data directory
pub fn default_config_path() -> AppResult<PathBuf> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

/// Load application config. A missing file yields the defaults.
pub fn load_app_config(path: &Path) -> AppResult<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

    let config: AppConfig = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;
    config.proxy.validate().map_err(AppError::Config)?;
    Ok(config)
}
