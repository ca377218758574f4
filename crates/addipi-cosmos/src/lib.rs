//! Cosmos DB job store adapter.
//!
//! Implements [`addipi_scheduler::JobStore`] against the Cosmos DB REST
//! API: parameterized SQL queries for the due-job scan and etag-conditional
//! document replaces for the claim protocol.

mod auth;
mod client;

pub use client::{CosmosJobStore, JOBS_CONTAINER, JOBS_DATABASE};
