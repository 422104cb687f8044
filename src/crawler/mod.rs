//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - The per-job frontier with deduplication and a request budget
//! - The worker pool that fetches, extracts and follows links
//! - Per-job statistics

mod fetcher;
mod frontier;
mod stats;
mod worker;

pub use fetcher::{build_http_client, FetchedPage, Fetcher, HttpFetcher};
pub use frontier::{EntryLabel, Frontier, FrontierEntry, Next};
pub use stats::{EntryOutcome, JobStats};
pub use worker::WorkerPool;
