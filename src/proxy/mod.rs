// proxy module - resource relay service

pub mod common;
pub mod config;
pub mod error;
pub mod handlers; // API endpoint handlers
pub mod middleware; // Axum middleware
pub mod proxified;
pub mod server;
pub mod upstream; // Upstream client

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use proxified::get_proxified_resource_url;
pub use server::{build_router, AppState, AxumServer};
