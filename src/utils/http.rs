use crate::error::{AppError, AppResult};
use crate::proxy::config::UpstreamProxyConfig;
use reqwest::{Client, Proxy};
use std::time::Duration;

const USER_AGENT: &str = concat!("resource-proxy/", env!("CARGO_PKG_VERSION"));

/// Create an HTTP client with the given timeout and optional outbound proxy
pub fn create_client_with_proxy(
    timeout_secs: u64,
    proxy_config: Option<&UpstreamProxyConfig>,
) -> AppResult<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT);

    if let Some(config) = proxy_config {
        if config.enabled && !config.url.is_empty() {
            let proxy = Proxy::all(&config.url).map_err(|e| {
                AppError::Config(format!("Invalid proxy address {}: {}", config.url, e))
            })?;
            builder = builder.proxy(proxy);
            tracing::info!("HTTP client upstream proxy enabled: {}", config.url);
        }
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_without_proxy() {
        assert!(create_client_with_proxy(5, None).is_ok());
    }

    #[test]
    fn test_disabled_proxy_is_ignored() {
        let config = UpstreamProxyConfig {
            enabled: false,
            url: "not a url".to_string(),
        };
        assert!(create_client_with_proxy(5, Some(&config)).is_ok());
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let config = UpstreamProxyConfig {
            enabled: true,
            url: "::not a url::".to_string(),
        };
        let err = create_client_with_proxy(5, Some(&config)).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
