//! Shared state of one running job

use crate::crawler::{Frontier, JobStats};
use crate::extract::ExtractedRecord;
use crate::job::{JobEvent, JobId, JobSpec, JobStatus};
use crate::TrawlError;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// State shared between a job's workers and the manager
///
/// Workers only touch the frontier, the emit counter and the event sender of
/// their own job. Status changes and emissions are serialized through the
/// status lock, so once `stop` returns no further record is delivered.
#[derive(Debug)]
pub struct JobState {
    id: JobId,
    spec: JobSpec,
    status: Mutex<JobStatus>,
    emitted: AtomicU32,
    finished: AtomicBool,
    cancel: CancellationToken,
    frontier: Frontier,
    events: UnboundedSender<JobEvent>,
}

impl JobState {
    pub fn new(id: JobId, spec: JobSpec, events: UnboundedSender<JobEvent>) -> Self {
        let frontier = Frontier::new(spec.max_requests());
        Self {
            id,
            spec,
            status: Mutex::new(JobStatus::Running),
            emitted: AtomicU32::new(0),
            finished: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            frontier,
            events,
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, JobStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn status(&self) -> JobStatus {
        *self.lock_status()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.status() == JobStatus::Stopped
    }

    /// Records delivered so far
    pub fn emitted(&self) -> u32 {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Delivers a record if the job is running and below its limit
    ///
    /// Returns true if the record was sent. Reaching the limit closes the
    /// frontier.
    pub fn try_emit(&self, record: ExtractedRecord) -> bool {
        let status = self.lock_status();
        if *status != JobStatus::Running {
            return false;
        }

        let emitted = self.emitted.load(Ordering::SeqCst);
        if emitted >= self.spec.limit {
            return false;
        }

        if self.events.send(JobEvent::Record(record)).is_err() {
            tracing::debug!("Job {} subscriber dropped its receiver", self.id);
        }

        let emitted = emitted + 1;
        self.emitted.store(emitted, Ordering::SeqCst);
        if emitted >= self.spec.limit {
            tracing::info!("Job {} reached its limit of {} records", self.id, self.spec.limit);
            self.frontier.close();
        }
        true
    }

    /// Requests a stop
    ///
    /// Returns true if the job was running and is now stopped.
    pub fn stop(&self) -> bool {
        let mut status = self.lock_status();
        if !status.can_transition_to(JobStatus::Stopped) {
            return false;
        }

        *status = JobStatus::Stopped;
        self.cancel.cancel();
        self.frontier.close();
        true
    }

    /// Moves the job to its terminal state and sends the terminal event
    ///
    /// Only the first call has any effect. A stopped job always ends with
    /// `Complete`, whatever the pool returned.
    pub fn finish(&self, outcome: Result<JobStats, TrawlError>) -> JobStatus {
        let mut status = self.lock_status();
        if self.finished.swap(true, Ordering::SeqCst) {
            return *status;
        }

        let event = match (*status, outcome) {
            (JobStatus::Stopped, Ok(stats)) => JobEvent::Complete(stats),
            (JobStatus::Stopped, Err(e)) => {
                tracing::debug!("Job {} stopped; ignoring late error: {}", self.id, e);
                JobEvent::Complete(JobStats {
                    records_emitted: self.emitted(),
                    ..JobStats::default()
                })
            }
            (_, Ok(stats)) => {
                *status = JobStatus::Completed;
                JobEvent::Complete(stats)
            }
            (_, Err(e)) => {
                *status = JobStatus::Failed;
                JobEvent::Error(e.to_string())
            }
        };

        self.cancel.cancel();
        self.frontier.close();
        if self.events.send(event).is_err() {
            tracing::debug!("Job {} finished with no subscriber", self.id);
        }
        *status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::crawler::EntryLabel;
    use crate::extract::SourceType;
    use crate::job::{JobEvents, JobRequest};
    use tokio::sync::mpsc;

    fn state(limit: i64) -> (JobState, JobEvents) {
        let spec = JobRequest::site("https://a.test/")
            .with_limit(limit)
            .into_spec(&CrawlerConfig::default())
            .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (JobState::new(JobId::new(), spec, tx), JobEvents::new(rx))
    }

    fn record(url: &str) -> ExtractedRecord {
        ExtractedRecord::new(url.to_string(), url.to_string(), SourceType::Page)
    }

    #[tokio::test]
    async fn test_emit_respects_limit_and_closes_frontier() {
        let (state, events) = state(2);
        state.frontier().enqueue("https://a.test/x", EntryLabel::Content);

        assert!(state.try_emit(record("https://a.test/1")));
        assert!(!state.frontier().is_closed());
        assert!(state.try_emit(record("https://a.test/2")));
        assert!(state.frontier().is_closed());
        assert!(!state.try_emit(record("https://a.test/3")));
        assert_eq!(state.emitted(), 2);

        state.finish(Ok(JobStats::default()));
        let (records, terminal) = events.collect().await;
        assert_eq!(records.len(), 2);
        assert!(matches!(terminal, Some(JobEvent::Complete(_))));
    }

    #[tokio::test]
    async fn test_no_emission_after_stop() {
        let (state, events) = state(5);
        assert!(state.stop());
        assert!(!state.stop());
        assert!(state.is_stopped());
        assert!(state.cancel_token().is_cancelled());
        assert!(!state.try_emit(record("https://a.test/1")));

        assert_eq!(state.finish(Ok(JobStats::default())), JobStatus::Stopped);
        let (records, terminal) = events.collect().await;
        assert!(records.is_empty());
        assert!(matches!(terminal, Some(JobEvent::Complete(_))));
    }

    #[tokio::test]
    async fn test_fatal_error_fails_job() {
        let (state, events) = state(5);
        let status = state.finish(Err(TrawlError::JobFatal("no seeds".to_string())));
        assert_eq!(status, JobStatus::Failed);
        assert!(!state.stop());

        let (_, terminal) = events.collect().await;
        assert!(matches!(terminal, Some(JobEvent::Error(msg)) if msg.contains("no seeds")));
    }

    #[tokio::test]
    async fn test_finish_sends_one_terminal_event() {
        let (state, mut events) = state(5);
        state.finish(Ok(JobStats::default()));
        state.finish(Err(TrawlError::JobFatal("late".to_string())));

        assert_eq!(state.status(), JobStatus::Completed);
        assert!(matches!(events.recv().await, Some(JobEvent::Complete(_))));
        assert!(events.recv().await.is_none());
    }
}
