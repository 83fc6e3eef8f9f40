// URL validation
//
// Only absolute URLs of the form `scheme://authority...` are accepted. The
// WHATWG parser alone is too lenient here: it turns `http:host` into
// `http://host/`, so the raw authority marker is checked first.

use crate::proxy::error::ProxyError;
use url::Url;

/// Extract the lowercased scheme, if the string starts with a syntactically
/// valid one
pub fn url_scheme(raw: &str) -> Option<String> {
    let (scheme, _) = raw.trim().split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

/// Parse `raw` into a URL that has both a scheme and a host
pub fn validate_url(raw: &str) -> Result<Url, ProxyError> {
    let trimmed = raw.trim();
    let invalid = || ProxyError::InvalidUrl(raw.to_string());

    let scheme = url_scheme(trimmed).ok_or_else(invalid)?;
    let rest = &trimmed[scheme.len() + 1..];
    let authority = rest.strip_prefix("//").ok_or_else(invalid)?;
    if authority.is_empty() || authority.starts_with('/') {
        return Err(invalid());
    }

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(invalid()),
    }
}
