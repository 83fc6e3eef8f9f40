pub mod error;
pub mod models;
pub mod modules;
pub mod proxy; // Relay service module
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use error::AppResult;
use models::AppConfig;
use modules::{MemoryResourceStore, ResourceStore};
use tracing::{info, warn};

/// Command line overrides applied on top of the config file
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub allow_lan_access: bool,
}

/// Resolve the effective configuration
pub fn resolve_config(options: &RunOptions) -> AppResult<AppConfig> {
    let path = match &options.config_path {
        Some(path) => path.clone(),
        None => modules::config::default_config_path()?,
    };
    let mut config = modules::config::load_app_config(&path)?;

    if let Some(port) = options.port {
        config.proxy.port = port;
    }
    if options.allow_lan_access {
        config.proxy.allow_lan_access = true;
    }
    if options.catalog_path.is_some() {
        config.catalog_path = options.catalog_path.clone();
    }
    Ok(config)
}

/// Load config and catalog, serve until Ctrl-C
pub async fn run(options: RunOptions) -> AppResult<()> {
    let config = resolve_config(&options)?;
    let _log_guard = modules::logger::init_logger(config.log_dir.as_deref());

    let store: Arc<dyn ResourceStore> = match &config.catalog_path {
        Some(path) => Arc::new(modules::load_catalog(path)?),
        None => {
            warn!("No catalog configured, every lookup will return 404");
            Arc::new(MemoryResourceStore::new())
        }
    };

    let proxy_config = config.proxy.clone();
    info!(
        "Max file size {} bytes, proxied schemes {:?}, timeout {}s",
        proxy_config.max_file_size, proxy_config.proxy_schemes, proxy_config.request_timeout
    );

    let host = proxy_config.get_bind_address().to_string();
    let port = proxy_config.port;
    let state = proxy::AppState::new(proxy_config, store)?;
    let (server, handle) = proxy::AxumServer::start(&host, port, state).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    server.stop();
    handle.await.ok();
    Ok(())
}
