// Scheme allow-list

/// Decide whether a URL with `scheme` is relayed.
///
/// `override_scheme` replaces the allow-list for this single decision.
pub fn should_proxy(scheme: &str, allowed: &[String], override_scheme: Option<&str>) -> bool {
    match override_scheme {
        Some(only) => scheme.eq_ignore_ascii_case(only),
        None => allowed.iter().any(|s| scheme.eq_ignore_ascii_case(s)),
    }
}
