//! Error types for the scheduler.

use thiserror::Error;

/// Errors from the job store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or answered with a server error.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A conditional write lost to a concurrent claim. Benign: the job was
    /// taken by another worker and must be skipped, not retried.
    #[error("write precondition failed for job {id}")]
    Conflict { id: String },

    /// The store rejected our credentials.
    #[error("store authorization failed: {0}")]
    Auth(String),

    /// The store answered with something we could not interpret.
    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the device channel.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event could not be handed off to the transport.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The device endpoint rejected our credentials.
    #[error("dispatch authorization failed: {0}")]
    Auth(String),
}

/// Errors surfaced by scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Dispatch error.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}
