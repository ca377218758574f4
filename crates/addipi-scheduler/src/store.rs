//! Job store seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Job, JobStatus, StoreError};

/// Read/write surface of the persisted job queue.
///
/// The scheduler is the sole writer of the `scheduled -> printing`
/// transition; implementations must make [`JobStore::mark_job`] conditional
/// on the state the job was read with, so a concurrent claim surfaces as
/// [`StoreError::Conflict`] instead of a silent double dispatch.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// All jobs with `status == scheduled` and `scheduled_at <= now`, in
    /// store order. Must not mutate state.
    async fn query_due_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Job>, StoreError>;

    /// Replace the job document with `new_status`, conditioned on the
    /// concurrency token the job was read with. Returns the stored document
    /// (carrying its fresh token).
    async fn mark_job(&self, job: &Job, new_status: JobStatus) -> Result<Job, StoreError>;

    /// Number of jobs currently in `status`.
    async fn count_by_status(&self, status: JobStatus) -> Result<u64, StoreError>;
}
