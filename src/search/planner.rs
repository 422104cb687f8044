use crate::config::SearchConfig;
use crate::TrawlError;
use url::Url;

/// Records harvested per planned result page, used to size the plan
pub const RECORDS_PER_RESULT_PAGE: u32 = 5;

/// Builds the combined search query from a topic and a keyword string
///
/// Both parts are trimmed and joined with a single space; blank parts are
/// skipped.
///
/// # Errors
///
/// Returns `TrawlError::InvalidConfig` if both parts are blank.
///
/// # Examples
///
/// ```
/// use sumi_trawl::search::build_query;
///
/// assert_eq!(build_query(" rust ", "async, tokio").unwrap(), "rust async, tokio");
/// assert!(build_query(" ", "").is_err());
/// ```
pub fn build_query(topic: &str, keywords: &str) -> Result<String, TrawlError> {
    let query = [topic.trim(), keywords.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if query.is_empty() {
        return Err(TrawlError::InvalidConfig(
            "gather jobs require a topic or keywords".to_string(),
        ));
    }

    Ok(query)
}

/// Number of result pages planned for a given record limit
///
/// `min(max_pages, ceil(limit / 5))`, and at least one page.
pub fn planned_pages(limit: u32, max_pages: u32) -> u32 {
    limit
        .div_ceil(RECORDS_PER_RESULT_PAGE)
        .clamp(1, max_pages.max(1))
}

/// Builds the paginated seed URLs for a Gather job
///
/// Page `n` (zero based) carries `q=<query>` and, past the first page, the
/// offset `s = n * page_size`.
///
/// # Errors
///
/// Returns `TrawlError::JobFatal` if the provider URL cannot be parsed, since
/// no seed can be constructed from it, or if a page offset overflows.
pub fn plan_seed_urls(
    query: &str,
    limit: u32,
    search: &SearchConfig,
) -> Result<Vec<Url>, TrawlError> {
    let base = Url::parse(&search.base_url).map_err(|e| {
        TrawlError::JobFatal(format!(
            "cannot build search URLs from '{}': {}",
            search.base_url, e
        ))
    })?;

    let pages = planned_pages(limit, search.max_pages);
    let urls = (0..pages)
        .map(|page| {
            let offset = page.checked_mul(search.page_size).ok_or_else(|| {
                TrawlError::JobFatal(format!(
                    "result offset overflows for page {} of size {}",
                    page, search.page_size
                ))
            })?;

            let mut url = base.clone();
            {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("q", query);
                if page > 0 {
                    pairs.append_pair("s", &offset.to_string());
                }
            }
            Ok(url)
        })
        .collect::<Result<Vec<Url>, TrawlError>>()?;

    if urls.is_empty() {
        return Err(TrawlError::JobFatal(format!(
            "no search URLs planned for '{}'",
            query
        )));
    }

    tracing::debug!("Planned {} search pages for query '{}'", urls.len(), query);
    Ok(urls)
}
