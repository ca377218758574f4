//! Device channel seam.

use async_trait::async_trait;

use crate::DispatchError;

/// Outbound start-signal channel to the configured printer.
#[async_trait]
pub trait SignalDispatcher: Send + Sync {
    /// Send one `print_start` event for the given file. `Ok` means the
    /// transport accepted the event, not that the device acknowledged it.
    async fn send_start_signal(&self, file_id: &str) -> Result<(), DispatchError>;
}
