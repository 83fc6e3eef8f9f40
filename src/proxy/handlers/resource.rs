// Resource relay handler
//
// validate -> scheme check -> HEAD probe -> GET -> size checks -> relay.
// Every failure is terminal for the request; the upstream response is
// dropped (closing its connection) before the error is returned.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::ResourceAndPackage;
use crate::modules::ResourceStore;
use crate::proxy::common::{collect_limited, declared_length, should_proxy, validate_url, SizeLimit};
use crate::proxy::config::ProxyConfig;
use crate::proxy::error::ProxyError;
use crate::proxy::proxified::get_proxified_resource_url;
use crate::proxy::server::AppState;
use crate::proxy::upstream::{ensure_success, UpstreamClient};

/// Headers that describe the upstream connection rather than the content
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Fully checked upstream answer, ready to send
#[derive(Debug)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

#[derive(Debug)]
pub enum ProxyOutcome {
    Relayed(ProxiedResponse),
    /// Scheme is not proxied; the client should fetch this URL itself.
    /// Holds the original URL as a ready `Location` value.
    PassThrough(HeaderValue),
}

/// Resolve the package/resource pair addressed by the route
pub fn lookup(
    store: &dyn ResourceStore,
    package_id: &str,
    resource_id: &str,
) -> Result<ResourceAndPackage, ProxyError> {
    let package = store
        .package_show(package_id)
        .ok_or_else(|| ProxyError::NotFound(format!("package {}", package_id)))?;
    let resource = store
        .resource_show(resource_id)
        .ok_or_else(|| ProxyError::NotFound(format!("resource {}", resource_id)))?;

    if resource.package_id != package.id {
        return Err(ProxyError::NotFound(format!(
            "resource {} in package {}",
            resource_id, package_id
        )));
    }

    Ok(ResourceAndPackage { resource, package })
}

/// Fetch the resource upstream and return the body if every check passes
pub async fn proxy_resource(
    upstream: &UpstreamClient,
    config: &ProxyConfig,
    data: &ResourceAndPackage,
) -> Result<ProxyOutcome, ProxyError> {
    let raw_url = &data.resource.url;
    let url = validate_url(raw_url)?;

    if !should_proxy(url.scheme(), &config.proxy_schemes, None) {
        debug!("Scheme {} not proxied, passing through {}", url.scheme(), raw_url);
        // the URL parser drops control characters that a header cannot carry
        let location = HeaderValue::from_str(raw_url.trim())
            .map_err(|_| ProxyError::InvalidUrl(raw_url.clone()))?;
        return Ok(ProxyOutcome::PassThrough(location));
    }

    let limit = SizeLimit::new(config.max_file_size);

    if let Some(head) = upstream.probe(&url).await? {
        limit.check_declared(declared_length(head.headers()))?;
    }

    let response = upstream.fetch(&url).await?;
    ensure_success(&response)?;
    let declared = declared_length(response.headers());
    limit.check_declared(declared)?;

    let status = response.status();
    let headers = relay_headers(response.headers(), data.resource.mimetype.as_deref());
    let body = collect_limited(limit.wrap(response.bytes_stream()), declared).await?;

    info!(
        "Proxied resource {} ({} bytes, status {})",
        data.resource.id,
        body.len(),
        status.as_u16()
    );

    Ok(ProxyOutcome::Relayed(ProxiedResponse {
        status,
        headers,
        body,
    }))
}

/// Copy end-to-end headers, falling back to the resource's mime-type when
/// upstream sends no content-type
pub fn relay_headers(upstream: &HeaderMap, mimetype: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if !headers.contains_key(header::CONTENT_TYPE) {
        if let Some(value) = mimetype.and_then(|m| HeaderValue::from_str(m).ok()) {
            headers.insert(header::CONTENT_TYPE, value);
        }
    }

    headers
}

/// GET /dataset/:id/resource/:resource_id/proxy
pub async fn handle_proxy_resource(
    State(state): State<AppState>,
    Path((package_id, resource_id)): Path<(String, String)>,
) -> Response {
    let data = match lookup(state.store.as_ref(), &package_id, &resource_id) {
        Ok(d) => d,
        Err(e) => return e.into_response(),
    };

    match proxy_resource(&state.upstream, &state.config, &data).await {
        Ok(ProxyOutcome::Relayed(response)) => response.into_response(),
        Ok(ProxyOutcome::PassThrough(location)) => (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, location)],
        )
            .into_response(),
        Err(e) => {
            warn!(
                "Proxy of resource {} ({}) failed: {}",
                resource_id, data.resource.url, e
            );
            e.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProxifiedQuery {
    /// Proxy this scheme instead of the configured allow-list
    pub scheme: Option<String>,
}

/// GET /dataset/:id/resource/:resource_id/proxified_url
pub async fn handle_proxified_url(
    State(state): State<AppState>,
    Path((package_id, resource_id)): Path<(String, String)>,
    Query(query): Query<ProxifiedQuery>,
) -> Result<Json<serde_json::Value>, ProxyError> {
    let data = lookup(state.store.as_ref(), &package_id, &resource_id)?;
    let proxified =
        get_proxified_resource_url(&data, &state.config, query.scheme.as_deref());

    Ok(Json(serde_json::json!({
        "url": data.resource.url,
        "proxified_url": proxified,
        "proxied": proxified != data.resource.url,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Package, Resource};
    use crate::modules::MemoryResourceStore;

    fn store() -> MemoryResourceStore {
        let mut store = MemoryResourceStore::new();
        store.insert_package(Package {
            id: "p1".into(),
            name: "annakarenina".into(),
        });
        store.insert_package(Package {
            id: "p2".into(),
            name: "warandpeace".into(),
        });
        store.insert_resource(Resource {
            id: "r1".into(),
            package_id: "p1".into(),
            url: "http://www.ckan.org/static/example.json".into(),
            mimetype: None,
        });
        store
    }

    #[test]
    fn test_lookup_by_name_or_id() {
        let store = store();
        assert!(lookup(&store, "annakarenina", "r1").is_ok());
        assert!(lookup(&store, "p1", "r1").is_ok());
    }

    #[test]
    fn test_lookup_rejects_foreign_package() {
        let store = store();
        let err = lookup(&store, "warandpeace", "r1").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(lookup(&store, "annakarenina", "r9").is_err());
        assert!(lookup(&store, "nobody", "r1").is_err());
    }

    #[test]
    fn test_relay_headers_strips_hop_by_hop() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        upstream.insert(header::ETAG, HeaderValue::from_static("\"abc\""));

        let relayed = relay_headers(&upstream, Some("application/json"));
        assert_eq!(relayed.get(header::CONTENT_TYPE).unwrap(), "text/csv");
        assert_eq!(relayed.get(header::ETAG).unwrap(), "\"abc\"");
        assert!(relayed.get(header::CONTENT_LENGTH).is_none());
        assert!(relayed.get(header::TRANSFER_ENCODING).is_none());
        assert!(relayed.get(header::CONNECTION).is_none());
    }

    #[test]
    fn test_relay_headers_mimetype_fallback() {
        let relayed = relay_headers(&HeaderMap::new(), Some("application/json"));
        assert_eq!(relayed.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert!(relay_headers(&HeaderMap::new(), None).is_empty());
    }
}
