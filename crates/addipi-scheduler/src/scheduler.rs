//! The poll-claim-dispatch loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::{Job, JobStatus, JobStore, SignalDispatcher, StoreError};

/// Default scan interval, matching the original once-a-minute cadence.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Counters for one scan of the job queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Due jobs returned by the store query.
    pub queried: usize,
    /// Jobs successfully transitioned `scheduled -> printing`.
    pub claimed: usize,
    /// Claimed jobs whose start signal was handed off.
    pub dispatched: usize,
    /// Claimed jobs whose dispatch failed (marked `failed`).
    pub failed: usize,
    /// Jobs skipped because another worker claimed them first.
    pub conflicts: usize,
}

/// The job-dispatch scheduler.
///
/// Owns the `scheduled -> printing` transition; the store and the device
/// channel are injected so tests can substitute doubles.
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    dispatcher: Arc<dyn SignalDispatcher>,
    poll_interval: Duration,
}

impl Scheduler {
    /// Create a new scheduler over the given adapters.
    pub fn new(store: Arc<dyn JobStore>, dispatcher: Arc<dyn SignalDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    /// Override the scan interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the scheduler loop until shutdown.
    ///
    /// Ticks are serialized on this task; if one overruns the interval the
    /// missed firings are skipped rather than bursted.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "scheduler starting"
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_tick(Utc::now()).await;
                }
                changed = shutdown_rx.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("scheduler received shutdown signal");
                        break;
                    }
                }
            }
        }

        info!("scheduler shut down gracefully");
    }

    /// One scan of the queue: claim then dispatch every due job.
    ///
    /// Per-job failures are isolated; a query failure aborts the whole tick
    /// with every job state unchanged, to be retried next tick.
    #[tracing::instrument(skip(self), fields(now = %now))]
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();

        let due = match self.store.query_due_jobs(now).await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "due-job query failed, retrying next tick");
                return summary;
            }
        };
        summary.queried = due.len();

        for job in due {
            self.process_job(job, &mut summary).await;
        }

        if summary.queried > 0 {
            info!(
                queried = summary.queried,
                claimed = summary.claimed,
                dispatched = summary.dispatched,
                failed = summary.failed,
                conflicts = summary.conflicts,
                "tick complete"
            );
        }
        summary
    }

    /// Claim one job and dispatch its start signal.
    async fn process_job(&self, job: Job, summary: &mut TickSummary) {
        if !job.can_transition_to(JobStatus::Printing) {
            // The query contract only returns scheduled jobs.
            warn!(job_id = %job.id, status = %job.status, "due job not claimable, skipping");
            return;
        }

        // Claim first; dispatch only once the transition is durable.
        let claimed = match self.store.mark_job(&job, JobStatus::Printing).await {
            Ok(claimed) => claimed,
            Err(StoreError::Conflict { .. }) => {
                debug!(job_id = %job.id, "job already claimed by another worker");
                summary.conflicts += 1;
                return;
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "claim failed, job stays scheduled");
                return;
            }
        };
        summary.claimed += 1;

        match self.dispatcher.send_start_signal(&claimed.file_id).await {
            Ok(()) => {
                summary.dispatched += 1;
                info!(
                    job_id = %claimed.id,
                    file_id = %claimed.file_id,
                    scheduled_at = %claimed.scheduled_at,
                    "print start dispatched"
                );
            }
            Err(e) => {
                summary.failed += 1;
                error!(job_id = %claimed.id, error = %e, "dispatch failed, marking job failed");
                if let Err(e) = self.store.mark_job(&claimed, JobStatus::Failed).await {
                    error!(
                        job_id = %claimed.id,
                        error = %e,
                        "could not mark job failed, job left printing"
                    );
                }
            }
        }
    }
}
