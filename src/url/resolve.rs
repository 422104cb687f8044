//! Link resolution for discovered anchors
//!
//! Site pages hand their raw `href` values to [`resolve_href`], which turns
//! them into absolute, fetchable URLs. Search-result pages go through
//! [`resolve_search_result`], which additionally unwraps the provider's
//! redirect wrapper and refuses links pointing back at the provider.

use crate::url::matcher::{matches_wildcard, sibling_pattern};
use url::{Host, Url};

/// Path prefix the search provider uses for its redirect wrapper
pub const REDIRECT_PATH_PREFIX: &str = "/l/";

/// Query parameter of the redirect wrapper holding the real destination
pub const REDIRECT_TARGET_PARAM: &str = "uddg";

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - anything that does not resolve to HTTP(S)
pub fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    base_url.join(href).ok().filter(is_http)
}

/// Returns true if the href was written as an absolute http(s) URL
pub fn is_absolute_http(href: &str) -> bool {
    Url::parse(href.trim()).is_ok_and(|url| is_http(&url))
}

/// Returns true if the URL belongs to the search provider
///
/// A URL is the provider's own when it shares the provider's origin or, for
/// domain hosts, lives under the provider's parent domain.
pub fn is_provider_origin(url: &Url, provider: &Url) -> bool {
    if url.origin() == provider.origin() {
        return true;
    }

    match (url.host(), provider.host()) {
        (Some(Host::Domain(candidate)), Some(Host::Domain(provider_host))) => {
            matches_wildcard(&sibling_pattern(provider_host), candidate)
        }
        _ => false,
    }
}

/// Unwraps a provider redirect wrapper, if the href is one
///
/// Returns:
/// - `None` if the href is not a redirect wrapper
/// - `Some(None)` if it is a wrapper without a usable destination
/// - `Some(Some(url))` with the decoded destination otherwise
pub fn unwrap_redirect(href: &str, provider: &Url) -> Option<Option<Url>> {
    let joined = provider.join(href.trim()).ok()?;

    if !joined.path().starts_with(REDIRECT_PATH_PREFIX) || !is_provider_origin(&joined, provider) {
        return None;
    }

    let target = joined
        .query_pairs()
        .find(|(key, _)| key == REDIRECT_TARGET_PARAM)
        .and_then(|(_, value)| Url::parse(&value).ok());

    Some(target)
}

/// Resolves an anchor found on a search-results page
///
/// Redirect wrappers are unwrapped through their `uddg` parameter; wrappers
/// without one are discarded. The result must be an absolute http(s) URL
/// that does not point back at the provider.
pub fn resolve_search_result(href: &str, provider: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let target = match unwrap_redirect(href, provider) {
        Some(unwrapped) => unwrapped?,
        None => Url::parse(href).ok()?,
    };

    if !is_http(&target) || is_provider_origin(&target, provider) {
        return None;
    }

    Some(target)
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
