use serde::{Deserialize, Serialize};

/// Largest body the relay will forward (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Relay configuration, built once at startup and shared read-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Allow LAN access
    /// - false: bind 127.0.0.1 only (default)
    /// - true: bind 0.0.0.0
    #[serde(default)]
    pub allow_lan_access: bool,

    /// Listener port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of body bytes relayed per request
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Schemes eligible for proxying
    #[serde(default = "default_proxy_schemes")]
    pub proxy_schemes: Vec<String>,

    /// Upstream request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Public base URL of this relay. Proxified URLs are absolute when set,
    /// plain paths otherwise.
    #[serde(default)]
    pub site_url: Option<String>,

    /// Serve resources hosted on `site_url`'s own host directly
    #[serde(default)]
    pub bypass_same_origin: bool,

    /// Outbound proxy settings
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            max_file_size: default_max_file_size(),
            proxy_schemes: default_proxy_schemes(),
            request_timeout: default_request_timeout(),
            site_url: None,
            bypass_same_origin: false,
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    8046
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_proxy_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_request_timeout() -> u64 {
    5
}

impl ProxyConfig {
    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout == 0 {
            return Err("request_timeout must be at least 1 second".to_string());
        }
        if self.proxy_schemes.iter().any(|s| s.trim().is_empty()) {
            return Err("proxy_schemes must not contain empty entries".to_string());
        }
        Ok(())
    }

    /// Listener address derived from `allow_lan_access`
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: ProxyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_file_size, 1_048_576);
        assert_eq!(config.proxy_schemes, vec!["http", "https"]);
        assert_eq!(config.request_timeout, 5);
        assert_eq!(config.get_bind_address(), "127.0.0.1");
        assert!(config.site_url.is_none());
        assert!(!config.upstream_proxy.enabled);
    }

    #[test]
    fn test_validate() {
        assert!(ProxyConfig::default().validate().is_ok());

        let zero_timeout = ProxyConfig {
            request_timeout: 0,
            ..ProxyConfig::default()
        };
        assert!(zero_timeout.validate().unwrap_err().contains("request_timeout"));

        let empty_scheme = ProxyConfig {
            proxy_schemes: vec!["http".to_string(), " ".to_string()],
            ..ProxyConfig::default()
        };
        assert!(empty_scheme.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config: ProxyConfig = serde_json::from_str(
            r#"{"allow_lan_access": true, "max_file_size": 10, "proxy_schemes": ["ftp"]}"#,
        )
        .unwrap();
        assert_eq!(config.get_bind_address(), "0.0.0.0");
        assert_eq!(config.max_file_size, 10);
        assert_eq!(config.proxy_schemes, vec!["ftp"]);
    }
}
