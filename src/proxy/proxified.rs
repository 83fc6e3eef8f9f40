// Proxified URL construction (pure, no I/O)

use crate::models::ResourceAndPackage;
use crate::proxy::common::{should_proxy, url_scheme};
use crate::proxy::config::ProxyConfig;
use url::Url;

/// Path of the relay endpoint for a package/resource pair
pub fn proxy_path(package: &str, resource_id: &str) -> String {
    format!(
        "/dataset/{}/resource/{}/proxy",
        encode_segment(package),
        encode_segment(resource_id)
    )
}

/// URL a client should use to fetch `data.resource` through the relay.
///
/// Returns the resource URL verbatim when its scheme is not proxied.
/// `override_scheme` replaces the configured allow-list for this call.
pub fn get_proxified_resource_url(
    data: &ResourceAndPackage,
    config: &ProxyConfig,
    override_scheme: Option<&str>,
) -> String {
    let url = &data.resource.url;

    let Some(scheme) = url_scheme(url) else {
        return url.clone();
    };
    if !should_proxy(&scheme, &config.proxy_schemes, override_scheme) {
        return url.clone();
    }
    if config.bypass_same_origin && is_site_origin(config.site_url.as_deref(), url) {
        return url.clone();
    }

    let path = proxy_path(&data.package.name, &data.resource.id);
    let proxified = match &config.site_url {
        Some(site) => format!("{}{}", site.trim_end_matches('/'), path),
        None => path,
    };
    tracing::debug!("Proxified url is {}", proxified);
    proxified
}

fn is_site_origin(site_url: Option<&str>, url: &str) -> bool {
    let (Some(site), Ok(target)) = (site_url.and_then(|s| Url::parse(s).ok()), Url::parse(url))
    else {
        return false;
    };
    match (site.host_str(), target.host_str()) {
        (Some(a), Some(b)) => {
            a.eq_ignore_ascii_case(b) && site.port_or_known_default() == target.port_or_known_default()
        }
        _ => false,
    }
}

// form_urlencoded leaves only alphanumerics and `*-._` untouched; its `+` for
// space is the one substitution that is wrong inside a path.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
