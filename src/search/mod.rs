//! Search-driven discovery for Gather jobs
//!
//! Gather jobs do not start from a site: they plan a handful of result pages
//! against the search provider's HTML endpoint, mine those pages for result
//! links and harvest the linked pages.

mod planner;

pub use planner::{build_query, plan_seed_urls, planned_pages, RECORDS_PER_RESULT_PAGE};

/// `DuckDuckGo` HTML results endpoint
pub const DEFAULT_SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Result offset between consecutive provider pages
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Upper bound on result pages planned per job
pub const DEFAULT_MAX_PAGES: u32 = 5;

/// CSS selector for result anchors on the provider's HTML page
pub const RESULT_LINK_SELECTOR: &str = "a.result__a";

/// Fallback selector used when the provider markup yields no result anchors
pub const FALLBACK_LINK_SELECTOR: &str = "a[href]";
