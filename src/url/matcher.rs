/// Checks if a host matches a wildcard pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact match: "duckduckgo.com" matches only "duckduckgo.com"
/// 2. Wildcard match: "*.duckduckgo.com" matches the bare domain and every
///    subdomain ("html.duckduckgo.com", "links.duckduckgo.com", ...)
///
/// Hosts should be lowercased before calling; the comparison is exact.
///
/// # Examples
///
/// ```
/// use sumi_trawl::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.duckduckgo.com", "duckduckgo.com"));
/// assert!(matches_wildcard("*.duckduckgo.com", "html.duckduckgo.com"));
/// assert!(!matches_wildcard("*.duckduckgo.com", "notduckduckgo.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || candidate
                .strip_suffix(base)
                .is_some_and(|prefix| prefix.ends_with('.'))
    } else {
        candidate == pattern
    }
}

/// Builds the wildcard pattern covering a provider host and its siblings
///
/// `html.duckduckgo.com` becomes `*.duckduckgo.com`; a two-label host such
/// as `search.test` becomes `*.search.test`.
pub fn sibling_pattern(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() > 2 {
        format!("*.{}", labels[1..].join("."))
    } else {
        format!("*.{}", host)
    }
}
