//! The bounded-concurrency fetch/extract loop of one job
//!
//! This module contains the per-job worker pool, which:
//! - Drains the job's frontier with a fixed number of workers
//! - Fetches each entry through the [`Fetcher`] seam
//! - Parses, extracts and filters pages, and mines their links
//! - Emits accepted records through the job state
//! - Aggregates per-worker statistics when the frontier runs dry

use crate::config::{Config, SiteScope};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::{EntryLabel, FrontierEntry};
use crate::crawler::stats::{EntryOutcome, JobStats};
use crate::extract::{run_pipeline, ExtractedRecord, ParsedPage};
use crate::job::{JobMode, JobState, SeedSpec};
use crate::search::{FALLBACK_LINK_SELECTOR, RESULT_LINK_SELECTOR};
use crate::url::{classify_origin, resolve_href, resolve_search_result};
use crate::TrawlError;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// What processing one fetched page produced
#[derive(Debug, Default)]
struct PageResult {
    record: Option<ExtractedRecord>,
    links: Vec<Url>,
    rejected: bool,
}

/// Everything a worker needs, shared between the pool's workers
struct WorkerContext {
    job: Arc<JobState>,
    fetcher: Arc<dyn Fetcher>,
    site_scope: SiteScope,
    provider: Option<Url>,
}

/// Worker pool bound to a single job
pub struct WorkerPool {
    ctx: Arc<WorkerContext>,
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool for a job
    ///
    /// # Errors
    ///
    /// Returns `TrawlError::JobFatal` if a Gather job's search provider URL
    /// cannot be parsed.
    pub fn new(
        job: Arc<JobState>,
        fetcher: Arc<dyn Fetcher>,
        config: &Config,
    ) -> Result<Self, TrawlError> {
        let provider = match job.spec().mode {
            JobMode::Gather => Some(Url::parse(&config.search.base_url).map_err(|e| {
                TrawlError::JobFatal(format!(
                    "invalid search provider URL '{}': {}",
                    config.search.base_url, e
                ))
            })?),
            JobMode::Site => None,
        };

        Ok(Self {
            ctx: Arc::new(WorkerContext {
                job,
                fetcher,
                site_scope: config.crawler.site_scope,
                provider,
            }),
            workers: config.crawler.max_concurrent_fetches.max(1) as usize,
        })
    }

    /// Runs the workers until the frontier is exhausted or the job stops
    pub async fn run(self) -> Result<JobStats, TrawlError> {
        let job = &self.ctx.job;
        tracing::debug!("Job {} starting {} workers", job.id(), self.workers);

        let mut set = JoinSet::new();
        for worker_id in 0..self.workers {
            let ctx = Arc::clone(&self.ctx);
            set.spawn(async move { ctx.run_worker(worker_id).await });
        }

        let mut stats = JobStats::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(worker_stats) => stats += worker_stats,
                Err(e) => {
                    // A lost worker never calls complete(); closing the
                    // frontier releases the others.
                    tracing::error!("Job {} worker terminated abnormally: {}", job.id(), e);
                    job.frontier().close();
                }
            }
        }

        stats.records_emitted = job.emitted();
        stats.urls_discovered = u32::try_from(job.frontier().visited_count()).unwrap_or(u32::MAX);

        tracing::info!(
            "Job {} pool finished: {} requests, {} records, {} URLs discovered, {} fetch failures, {} parse failures, {} rejected",
            job.id(),
            stats.requests,
            stats.records_emitted,
            stats.urls_discovered,
            stats.fetch_failures,
            stats.parse_failures,
            stats.rejected_by_filter
        );
        Ok(stats)
    }
}

impl WorkerContext {
    async fn run_worker(&self, worker_id: usize) -> JobStats {
        let mut stats = JobStats::default();
        let frontier = self.job.frontier();

        loop {
            if self.job.is_stopped() {
                break;
            }

            let Some(entry) = frontier.next(self.job.cancel_token()).await else {
                break;
            };

            if self.job.is_stopped() {
                frontier.complete();
                break;
            }

            let outcome = self.process_entry(&entry).await;
            tracing::trace!("Worker {} finished {}: {:?}", worker_id, entry.url, outcome);
            stats.record(outcome);
            frontier.complete();
        }

        stats
    }

    async fn process_entry(&self, entry: &FrontierEntry) -> EntryOutcome {
        tracing::debug!("Fetching {} ({:?})", entry.url, entry.label);

        let fetched = match self.fetcher.fetch(&entry.url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.url, e);
                return EntryOutcome::FetchFailed;
            }
        };

        if self.job.is_stopped() {
            return EntryOutcome::Abandoned;
        }

        // Links resolve against where the response actually came from
        let url = match Url::parse(&fetched.url).or_else(|_| Url::parse(&entry.url)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping unparseable URL {}: {}", entry.url, e);
                return EntryOutcome::ParseFailed;
            }
        };

        if !self.job.frontier().claim_landing(&entry.url, url.as_str()) {
            tracing::debug!("{} redirected to already visited {}", entry.url, url);
            return EntryOutcome::NoRecord;
        }

        let result = match self.process_page(url, &fetched.body, entry.label) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.url, e);
                return EntryOutcome::ParseFailed;
            }
        };

        let frontier = self.job.frontier();
        let queued = result
            .links
            .iter()
            .filter(|link| frontier.enqueue(link.as_str(), EntryLabel::Content))
            .count();
        if queued > 0 {
            tracing::debug!("Queued {} new links from {}", queued, entry.url);
        }

        match result.record {
            Some(record) => {
                if self.job.try_emit(record) {
                    EntryOutcome::Emitted
                } else {
                    EntryOutcome::NoRecord
                }
            }
            None if result.rejected => {
                tracing::debug!("Keyword filter rejected {}", entry.url);
                EntryOutcome::Rejected
            }
            None => EntryOutcome::NoRecord,
        }
    }

    /// Parses a body and derives its record and outbound links
    ///
    /// Synchronous: the parsed document is not `Send`.
    fn process_page(
        &self,
        url: Url,
        body: &str,
        label: EntryLabel,
    ) -> Result<PageResult, TrawlError> {
        let page = ParsedPage::parse(url, body)?;
        let spec = self.job.spec();

        match (spec.mode, label) {
            (JobMode::Gather, EntryLabel::SearchResults) => Ok(PageResult {
                links: self.search_result_links(&page),
                ..PageResult::default()
            }),
            (JobMode::Gather, EntryLabel::Content) => {
                let title = page.title().map(|t| t.to_lowercase());
                let accepted = spec.keywords.is_empty()
                    || spec
                        .keywords
                        .accepts(&page.body_text_lowercase(), title.as_deref());
                Ok(self.filtered(&page, accepted, Vec::new()))
            }
            (JobMode::Site, _) => {
                let accepted = spec.keywords.is_empty()
                    || spec.keywords.accepts(&page.body_text_lowercase(), None);
                let links = self.site_links(&page);
                Ok(self.filtered(&page, accepted, links))
            }
        }
    }

    fn filtered(&self, page: &ParsedPage, accepted: bool, links: Vec<Url>) -> PageResult {
        let spec = self.job.spec();
        PageResult {
            record: accepted.then(|| run_pipeline(page, &spec.selectors, spec.mode)),
            links,
            rejected: !accepted,
        }
    }

    fn site_links(&self, page: &ParsedPage) -> Vec<Url> {
        let seed = match &self.job.spec().seed {
            SeedSpec::Site(seed) => seed,
            SeedSpec::Gather { .. } => page.url(),
        };

        page.anchor_hrefs("a[href]")
            .iter()
            .filter_map(|href| resolve_href(href, page.url()))
            .filter(|link| classify_origin(link, seed).allowed_by(self.site_scope))
            .collect()
    }

    fn search_result_links(&self, page: &ParsedPage) -> Vec<Url> {
        let Some(provider) = &self.provider else {
            return Vec::new();
        };

        let mut hrefs = page.anchor_hrefs(RESULT_LINK_SELECTOR);
        if hrefs.is_empty() {
            tracing::debug!(
                "No '{}' anchors on {}, falling back to '{}'",
                RESULT_LINK_SELECTOR,
                page.url(),
                FALLBACK_LINK_SELECTOR
            );
            hrefs = page.anchor_hrefs(FALLBACK_LINK_SELECTOR);
        }

        hrefs
            .iter()
            .filter_map(|href| resolve_search_result(href, provider))
            .collect()
    }
}
