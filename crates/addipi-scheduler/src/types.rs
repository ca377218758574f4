//! Job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted print job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Store-assigned identity (also the partition key).
    pub id: String,
    /// Opaque reference to the artifact to print.
    pub file_id: String,
    /// Current status of the job.
    pub status: JobStatus,
    /// Earliest moment the job becomes eligible for dispatch.
    pub scheduled_at: DateTime<Utc>,
    /// Store concurrency token, present on documents read back from the
    /// store. Conditional writes send it as a precondition.
    #[serde(rename = "_etag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Current status of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its scheduled time.
    #[default]
    Scheduled,
    /// Claimed by the scheduler, start signal sent (or being sent).
    Printing,
    /// Finished successfully.
    Done,
    /// Terminal failure; re-queueing is an explicit operator action.
    Failed,
}

impl JobStatus {
    /// Wire representation, matching the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "scheduled",
            JobStatus::Printing => "printing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Job {
    /// Check whether this job is eligible for dispatch at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Scheduled && self.scheduled_at <= now
    }

    /// Check whether moving to `next` keeps the lifecycle monotonic
    /// (`scheduled -> printing -> {done | failed}`).
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self.status, next),
            (JobStatus::Scheduled, JobStatus::Printing)
                | (JobStatus::Printing, JobStatus::Done)
                | (JobStatus::Printing, JobStatus::Failed)
        )
    }
}
