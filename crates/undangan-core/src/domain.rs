//! Helpers for the strings a customer can be reached by.

/// Trim a configured base domain; empty means "not configured".
pub fn normalize_base_domain(base_domain: Option<&str>) -> Option<String> {
    base_domain
        .map(|d| d.trim().trim_matches('.').to_ascii_lowercase())
        .filter(|d| !d.is_empty())
}

/// The domain a customer gets for `slug`: `slug.base` when a base domain
/// is configured, otherwise the bare slug.
pub fn build_customer_domain(slug: &str, base_domain: Option<&str>) -> String {
    let slug = slug.trim();
    match base_domain.map(str::trim).filter(|d| !d.is_empty()) {
        None => slug.to_string(),
        Some(base) if slug.is_empty() => base.to_string(),
        Some(base) => format!("{slug}.{base}"),
    }
}

/// Both forms a customer domain derived from `slug` can take.
pub fn slug_domain_forms(slug: &str, base_domain: Option<&str>) -> Vec<String> {
    let slug = slug.trim();
    let mut forms = vec![slug.to_string()];
    if let Some(base) = base_domain.map(str::trim).filter(|d| !d.is_empty()) {
        forms.push(format!("{slug}.{base}"));
    }
    forms
}

/// Normalize a Host header value: trim, lower-case, drop a trailing dot
/// and any `:port` suffix.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => host,
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// `acme.example.com` under `example.com` is `acme`. Returns `None` when
/// `host` is not strictly below `base_domain`.
pub fn strip_base_domain<'a>(host: &'a str, base_domain: &str) -> Option<&'a str> {
    host.strip_suffix(base_domain)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|sub| !sub.is_empty())
}
