/// Job status definitions for tracking a run's lifecycle
use serde::Serialize;
use std::fmt;

/// Represents the current state of a job
///
/// Running is the only active state; every other state is terminal and a
/// job never leaves it once entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Workers are fetching and extracting
    Running,

    /// Stopped by an external request
    Stopped,

    /// Frontier exhausted or limit reached
    Completed,

    /// A fatal error ended the job
    Failed,
}

impl JobStatus {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Returns true if the transition to `next` is allowed
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(self, Self::Running) && next.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
