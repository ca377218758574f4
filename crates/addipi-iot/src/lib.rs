//! Azure IoT Hub device channel for Addipi.
//!
//! Implements [`addipi_scheduler::SignalDispatcher`] by posting
//! device-to-cloud events over HTTPS, authenticated with a shared-access
//! signature derived from the device connection string.

mod client;
mod sas;

pub use client::IotHubDispatcher;
pub use sas::{ConnectionString, IotError};
