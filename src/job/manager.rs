//! Job manager: the registry of running jobs and their lifecycle

use crate::config::Config;
use crate::crawler::{EntryLabel, Fetcher, HttpFetcher, JobStats, WorkerPool};
use crate::job::events::{JobEvents, JobHandle};
use crate::job::request::{JobRequest, JobSpec, SeedSpec};
use crate::job::state::JobState;
use crate::job::{JobId, JobStatus};
use crate::search::{build_query, plan_seed_urls};
use crate::TrawlError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use url::Url;

struct ManagerInner {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    registry: Mutex<HashMap<JobId, Arc<JobState>>>,
}

/// Starts, stops and tracks crawl jobs
///
/// Cloning is cheap; every clone shares the same registry. Jobs run on the
/// ambient tokio runtime, so `start_job` must be called from within one.
#[derive(Clone)]
pub struct JobManager {
    inner: Arc<ManagerInner>,
}

impl JobManager {
    /// Creates a manager fetching over HTTP
    pub fn new(config: Config) -> Result<Self, TrawlError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Creates a manager with a custom fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                config: Arc::new(config),
                fetcher,
                registry: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<JobId, Arc<JobState>>> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates a request, registers the job and starts its workers
    ///
    /// # Errors
    ///
    /// Returns `TrawlError::InvalidConfig` if the request is missing its
    /// mode-specific fields. Nothing is registered in that case.
    pub fn start_job(&self, request: JobRequest) -> Result<JobHandle, TrawlError> {
        let spec = request.into_spec(&self.inner.config.crawler)?;
        let id = JobId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(JobState::new(id, spec, sender));

        tracing::info!(
            "Starting {} job {} (limit {}, {} selectors, {} keywords)",
            state.spec().mode,
            id,
            state.spec().limit,
            state.spec().selectors.len(),
            state.spec().keywords.keywords().len()
        );

        self.registry().insert(id, Arc::clone(&state));

        let manager = self.clone();
        tokio::spawn(async move { manager.run_job(state).await });

        Ok(JobHandle {
            id,
            events: JobEvents::new(receiver),
        })
    }

    /// Requests a job to stop
    ///
    /// Unknown and already terminal jobs are ignored.
    pub fn stop_job(&self, id: JobId) {
        let state = self.registry().get(&id).cloned();
        match state {
            Some(state) if state.stop() => tracing::info!("Stop requested for job {}", id),
            Some(_) => tracing::debug!("Job {} is not running; stop ignored", id),
            None => tracing::debug!("Stop requested for unknown job {}", id),
        }
    }

    /// Current status of a registered job
    ///
    /// Jobs leave the registry once their terminal event is delivered.
    pub fn status(&self, id: JobId) -> Option<JobStatus> {
        self.registry().get(&id).map(|state| state.status())
    }

    /// Number of jobs currently registered
    pub fn active_jobs(&self) -> usize {
        self.registry().len()
    }

    async fn run_job(&self, state: Arc<JobState>) {
        let id = state.id();
        let outcome = self.drive(&state).await;

        if let Err(e) = &outcome {
            tracing::error!("Job {} failed: {}", id, e);
        }
        let status = state.finish(outcome);
        tracing::info!("Job {} finished as {}", id, status);

        self.registry().remove(&id);
    }

    async fn drive(&self, state: &Arc<JobState>) -> Result<JobStats, TrawlError> {
        let seeds = seed_urls(state.spec(), &self.inner.config)?;
        let queued = state
            .frontier()
            .seed(seeds.iter().map(|(url, label)| (url.as_str(), *label)));
        if queued == 0 {
            if state.is_stopped() {
                return Ok(JobStats::default());
            }
            return Err(TrawlError::JobFatal(format!(
                "job {} has no fetchable seed URL",
                state.id()
            )));
        }
        tracing::debug!("Job {} seeded with {} URLs", state.id(), queued);

        WorkerPool::new(
            Arc::clone(state),
            Arc::clone(&self.inner.fetcher),
            &self.inner.config,
        )?
        .run()
        .await
    }
}

/// The initial frontier entries of a job
///
/// Site jobs start from their URL; Gather jobs from the planned search
/// result pages.
pub fn seed_urls(spec: &JobSpec, config: &Config) -> Result<Vec<(Url, EntryLabel)>, TrawlError> {
    match &spec.seed {
        SeedSpec::Site(url) => Ok(vec![(url.clone(), EntryLabel::Content)]),
        SeedSpec::Gather { topic, keywords } => {
            let query = build_query(topic, keywords)?;
            let urls = plan_seed_urls(&query, spec.limit, &config.search)?;
            Ok(urls
                .into_iter()
                .map(|url| (url, EntryLabel::SearchResults))
                .collect())
        }
    }
}
