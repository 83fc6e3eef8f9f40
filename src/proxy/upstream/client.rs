// Upstream client
// One attempt per inbound request, no retries

use crate::error::AppResult;
use crate::proxy::config::ProxyConfig;
use crate::proxy::error::ProxyError;
use reqwest::{Client, Response};
use url::Url;

pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    pub fn new(config: &ProxyConfig) -> AppResult<Self> {
        let http_client = crate::utils::http::create_client_with_proxy(
            config.request_timeout,
            Some(&config.upstream_proxy),
        )?;
        Ok(Self { http_client })
    }

    /// Probe the resource with HEAD.
    ///
    /// Returns `None` for any non-2xx answer. Servers refuse HEAD for many
    /// reasons (405, or 403 on URLs signed for GET only), so only the GET
    /// status is authoritative.
    pub async fn probe(&self, url: &Url) -> Result<Option<Response>, ProxyError> {
        let response = self
            .http_client
            .head(url.clone())
            .send()
            .await
            .map_err(ProxyError::from_transport)?;

        if !response.status().is_success() {
            tracing::debug!(
                "HEAD refused by {} ({}), skipping probe",
                url,
                response.status()
            );
            return Ok(None);
        }

        Ok(Some(response))
    }

    /// Issue the GET. The body is left unread so it can be streamed.
    pub async fn fetch(&self, url: &Url) -> Result<Response, ProxyError> {
        self.http_client
            .get(url.clone())
            .send()
            .await
            .map_err(ProxyError::from_transport)
    }
}

/// Turn a non-2xx upstream answer into an error that carries the code
pub fn ensure_success(response: &Response) -> Result<(), ProxyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(ProxyError::UpstreamStatus {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    })
}
