use clap::Parser;
use std::path::PathBuf;

/// Relay catalog resources through a size- and scheme-limited HTTP proxy
#[derive(Debug, Parser)]
#[command(name = "resource-proxy", version)]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, env = "RESOURCE_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog of packages and resources (JSON)
    #[arg(long, env = "RESOURCE_PROXY_CATALOG")]
    catalog: Option<PathBuf>,

    /// Listener port
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind 0.0.0.0 instead of 127.0.0.1
    #[arg(long)]
    lan: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    resource_proxy_lib::run(resource_proxy_lib::RunOptions {
        config_path: cli.config,
        catalog_path: cli.catalog,
        port: cli.port,
        allow_lan_access: cli.lan,
    })
    .await?;

    Ok(())
}
