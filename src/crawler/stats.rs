//! Counters collected while a job's worker pool runs

use serde::Serialize;
use std::ops::AddAssign;

/// What happened to one dequeued entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// A record was emitted
    Emitted,
    /// The page was processed but produced no record (search page, filter
    /// rejection or emit limit already reached)
    NoRecord,
    /// The keyword filter rejected the page
    Rejected,
    /// The fetch failed
    FetchFailed,
    /// The body could not be parsed
    ParseFailed,
    /// The job was stopped while the fetch was in flight
    Abandoned,
}

/// Summary statistics for a finished job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    /// Fetches attempted
    pub requests: u32,
    /// Records delivered to subscribers
    pub records_emitted: u32,
    /// Distinct URLs ever queued, seeds included
    pub urls_discovered: u32,
    /// URLs skipped because the fetch failed
    pub fetch_failures: u32,
    /// URLs skipped because the body could not be parsed
    pub parse_failures: u32,
    /// Pages whose record the keyword filter rejected
    pub rejected_by_filter: u32,
}

impl JobStats {
    /// Counts one processed entry
    pub fn record(&mut self, outcome: EntryOutcome) {
        self.requests += 1;
        match outcome {
            EntryOutcome::FetchFailed => self.fetch_failures += 1,
            EntryOutcome::ParseFailed => self.parse_failures += 1,
            EntryOutcome::Rejected => self.rejected_by_filter += 1,
            EntryOutcome::Emitted | EntryOutcome::NoRecord | EntryOutcome::Abandoned => {}
        }
    }
}

impl AddAssign for JobStats {
    fn add_assign(&mut self, other: Self) {
        self.requests += other.requests;
        self.records_emitted += other.records_emitted;
        self.urls_discovered += other.urls_discovered;
        self.fetch_failures += other.fetch_failures;
        self.parse_failures += other.parse_failures;
        self.rejected_by_filter += other.rejected_by_filter;
    }
}
