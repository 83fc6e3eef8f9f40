use crate::proxy::ProxyConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// JSON catalog of packages and resources
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Rolling log directory, defaults to `<data dir>/logs`
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            catalog_path: None,
            log_dir: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
