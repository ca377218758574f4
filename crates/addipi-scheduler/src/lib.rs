//! Poll-claim-dispatch scheduler for Addipi print jobs.
//!
//! This crate provides the core scheduling loop that:
//! - Periodically scans the job store for jobs whose scheduled time has passed
//! - Claims each due job with a conditional `scheduled -> printing` write
//! - Emits a `print_start` signal to the printer for every claimed job
//!
//! The store and the device channel are injected behind the [`JobStore`] and
//! [`SignalDispatcher`] traits, so the loop itself carries no transport code.

mod dispatch;
mod error;
mod scheduler;
mod store;
mod types;

pub use dispatch::SignalDispatcher;
pub use error::{DispatchError, SchedulerError, StoreError};
pub use scheduler::{DEFAULT_POLL_INTERVAL_SECS, Scheduler, TickSummary};
pub use store::JobStore;
pub use types::{Job, JobStatus};
