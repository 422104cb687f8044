//! The event surface of a running job

use crate::crawler::JobStats;
use crate::extract::ExtractedRecord;
use crate::job::JobId;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

/// An event delivered to a job's subscriber
///
/// A job delivers zero or more `Record` events followed by exactly one
/// `Complete` or `Error`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum JobEvent {
    Record(ExtractedRecord),
    Complete(JobStats),
    Error(String),
}

impl JobEvent {
    /// Returns true for the final event of a job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }
}

/// Receiving side of a job's events
#[derive(Debug)]
pub struct JobEvents {
    receiver: UnboundedReceiver<JobEvent>,
    finished: bool,
}

impl JobEvents {
    pub(crate) fn new(receiver: UnboundedReceiver<JobEvent>) -> Self {
        Self {
            receiver,
            finished: false,
        }
    }

    /// Waits for the next event
    ///
    /// Returns None once the terminal event has been received.
    pub async fn recv(&mut self) -> Option<JobEvent> {
        if self.finished {
            return None;
        }

        let event = self.receiver.recv().await?;
        if event.is_terminal() {
            self.finished = true;
            self.receiver.close();
        }
        Some(event)
    }

    /// Drains every remaining event, returning the records and the final event
    pub async fn collect(mut self) -> (Vec<ExtractedRecord>, Option<JobEvent>) {
        let mut records = Vec::new();
        while let Some(event) = self.recv().await {
            match event {
                JobEvent::Record(record) => records.push(record),
                terminal => return (records, Some(terminal)),
            }
        }
        (records, None)
    }
}

/// Returned by `start_job`: the job's id plus its event stream
#[derive(Debug)]
pub struct JobHandle {
    pub id: JobId,
    pub events: JobEvents,
}
