//! Per-job frontier of URLs awaiting fetch
//!
//! This module handles:
//! - FIFO (breadth-first) ordering of queued URLs
//! - Deduplication by normalized URL through the visited set; entries keep
//!   the URL as written (minus its fragment) so relative links resolve
//!   against the real document location
//! - The per-job request budget (total entries ever dequeued)
//! - Tracking outstanding fetches so idle workers know when to stop
//!
//! All state sits behind one mutex, so the visited check and the insert are
//! a single atomic step: two workers discovering the same link at the same
//! time enqueue it once.

use crate::url::{normalize_parsed, normalize_url};
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a fetched page is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryLabel {
    /// A search provider result page: mined for links, never extracted
    SearchResults,
    /// A content page: extracted and filtered
    Content,
}

/// A URL queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The URL to fetch, fragment removed
    pub url: String,

    /// How the fetched page is processed
    pub label: EntryLabel,
}

/// Result of polling the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// A URL to process; must be followed by [`Frontier::complete`]
    Entry(FrontierEntry),
    /// Nothing queued, but in-flight fetches may still discover links
    Wait,
    /// No work remains for this job
    Exhausted,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
    dequeued: u32,
    in_flight: u32,
    closed: bool,
}

/// Frontier manages the queue of URLs to visit for one job
///
/// The frontier coordinates:
/// - Deduplication (a URL is marked visited the moment it is queued)
/// - The request budget (`max_requests` dequeues over the job's life)
/// - Shutdown (closing drops queued work and rejects new entries)
/// - Wake-ups for workers waiting on in-flight discoveries
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    max_requests: u32,
    notify: Notify,
}

impl Frontier {
    /// Creates an empty frontier with the given request budget
    pub fn new(max_requests: u32) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            max_requests,
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the initial entries, returning how many were queued
    pub fn seed<I, S>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (S, EntryLabel)>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .filter(|(url, label)| self.enqueue(url.as_ref(), *label))
            .count()
    }

    /// Adds a URL if it has not been seen and the frontier is still open
    ///
    /// Returns true if the URL was queued.
    pub fn enqueue(&self, url: &str, label: EntryLabel) -> bool {
        let mut target = match Url::parse(url.trim()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Not queueing {}: {}", url, e);
                return false;
            }
        };
        let key = match normalize_parsed(target.clone()) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!("Not queueing {}: {}", url, e);
                return false;
            }
        };
        target.set_fragment(None);

        {
            let mut state = self.lock();
            if state.closed || !state.visited.insert(key) {
                return false;
            }
            tracing::trace!("Queued {} ({:?})", target, label);
            state.queue.push_back(FrontierEntry {
                url: target.into(),
                label,
            });
        }

        self.notify.notify_waiters();
        true
    }

    /// Takes the next entry without waiting
    pub fn dequeue(&self) -> Next {
        let mut state = self.lock();

        if state.closed || state.dequeued >= self.max_requests {
            state.queue.clear();
            return Next::Exhausted;
        }

        if let Some(entry) = state.queue.pop_front() {
            state.dequeued += 1;
            state.in_flight += 1;
            return Next::Entry(entry);
        }

        if state.in_flight > 0 {
            Next::Wait
        } else {
            Next::Exhausted
        }
    }

    /// Waits for the next entry
    ///
    /// Returns None once the frontier is exhausted or the token is cancelled.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<FrontierEntry> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking state so a wake-up between
            // the check and the await is not lost.
            notified.as_mut().enable();

            match self.dequeue() {
                Next::Entry(entry) => return Some(entry),
                Next::Exhausted => return None,
                Next::Wait => {}
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Records where a fetch actually landed
    ///
    /// Returns false if `final_url` is a different page that was already
    /// visited, in which case the response is a duplicate and must not be
    /// processed. A new landing page is marked visited.
    pub fn claim_landing(&self, requested: &str, final_url: &str) -> bool {
        let Ok(landing) = normalize_url(final_url) else {
            return true;
        };
        if normalize_url(requested).is_ok_and(|key| key == landing) {
            return true;
        }
        self.lock().visited.insert(landing)
    }

    /// Marks a dequeued entry as fully processed
    pub fn complete(&self) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Drops queued work and rejects every later enqueue
    pub fn close(&self) {
        {
            let mut state = self.lock();
            state.closed = true;
            state.queue.clear();
        }
        self.notify.notify_waiters();
    }

    /// Returns whether the frontier has been closed
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns the number of queued URLs
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Returns how many distinct URLs were ever queued
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    /// Returns whether a URL (in any equivalent form) was ever queued
    pub fn has_visited(&self, url: &str) -> bool {
        normalize_url(url).is_ok_and(|normalized| self.lock().visited.contains(&normalized))
    }

    /// Returns how many entries have been handed out
    pub fn dequeued_count(&self) -> u32 {
        self.lock().dequeued
    }

    /// Returns the request budget
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}
