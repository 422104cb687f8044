use crate::UrlError;
use url::Url;

/// Normalizes a URL into the key used for frontier deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything but HTTP and HTTPS
/// 3. Lowercase the scheme and host (done by the parser for these schemes)
/// 4. Remove dot segments (done by the parser)
/// 5. Remove fragment (everything after #)
/// 6. Remove the trailing slash from the path, including the root path
///
/// Query strings are preserved verbatim: paginated search URLs differ only
/// by their query.
///
/// # Examples
///
/// ```
/// use sumi_trawl::url::normalize_url;
///
/// assert_eq!(normalize_url("HTTPS://A.TEST/").unwrap(), "https://a.test");
/// assert_eq!(normalize_url("https://a.test/b/#top").unwrap(), "https://a.test/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<String, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    let mut normalized = url.to_string();
    if url.path() == "/" && url.query().is_none() {
        normalized.pop();
    }

    Ok(normalized)
}
