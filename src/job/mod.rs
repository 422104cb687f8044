//! Job lifecycle management
//!
//! This module handles:
//! - Validating job requests into job specs
//! - The per-job shared state (status, emit counter, frontier, cancellation)
//! - The event stream delivered to a job's subscriber
//! - The manager owning the registry of running jobs

mod events;
mod manager;
mod request;
mod state;
mod status;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use events::{JobEvent, JobEvents, JobHandle};
pub use manager::{seed_urls, JobManager};
pub use request::{
    resolve_limit, JobRequest, JobSpec, LimitInput, SeedSpec, SelectorInput,
    GATHER_REQUEST_FACTOR,
};
pub use state::JobState;
pub use status::JobStatus;

/// How a job discovers pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Crawl outward from a single seed URL
    #[default]
    Site,
    /// Discover pages through search-provider result pages
    Gather,
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Site => f.write_str("site"),
            Self::Gather => f.write_str("gather"),
        }
    }
}

/// Opaque unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}
