//! URL handling module for Sumi-Trawl
//!
//! This module provides URL normalization, wildcard host matching, link
//! resolution (including search redirect unwrapping) and origin classification.

mod matcher;
mod normalize;
mod resolve;

use crate::config::SiteScope;
use url::Url;

// Re-export main functions
pub use matcher::{matches_wildcard, sibling_pattern};
pub use normalize::{normalize_parsed, normalize_url};
pub use resolve::{
    is_absolute_http, is_provider_origin, resolve_href, resolve_search_result, unwrap_redirect,
    REDIRECT_PATH_PREFIX, REDIRECT_TARGET_PARAM,
};

/// Where a discovered link points relative to the page it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkOrigin {
    /// Same scheme, host and port as the base page
    SameOrigin,
    /// Anywhere else
    CrossOrigin,
}

impl LinkOrigin {
    /// Returns true if a Site job with the given scope may follow this link
    pub fn allowed_by(&self, scope: SiteScope) -> bool {
        match scope {
            SiteScope::Any => true,
            SiteScope::SameOrigin => matches!(self, Self::SameOrigin),
        }
    }
}

/// Classifies a link as same-origin or cross-origin relative to a base URL
///
/// # Examples
///
/// ```
/// use sumi_trawl::url::{classify_origin, LinkOrigin};
/// use url::Url;
///
/// let base = Url::parse("https://a.test/").unwrap();
/// let link = Url::parse("https://a.test/b").unwrap();
/// assert_eq!(classify_origin(&link, &base), LinkOrigin::SameOrigin);
/// ```
pub fn classify_origin(candidate: &Url, base: &Url) -> LinkOrigin {
    if candidate.origin() == base.origin() {
        LinkOrigin::SameOrigin
    } else {
        LinkOrigin::CrossOrigin
    }
}
