//! Transport collaborators
//!
//! The BLE link itself lives outside this crate. A `Transport` receives the
//! encoded parameter buffer; inbound notifications are pushed into the session
//! through `SessionActorHandle::notify` by whatever owns the link (see
//! `ReplaySource` for a file-backed one).

use async_trait::async_trait;
use thiserror::Error;

pub mod console;
pub mod replay;

pub use console::ConsoleTransport;
pub use replay::ReplaySource;

/// Outbound write failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The write was attempted and rejected
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Outbound side of the device link
///
/// Note: `write` takes &self so transports can be shared as `Arc<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logs (e.g., "console", "ble")
    fn name(&self) -> &str;

    /// Write one buffer to the device without waiting for a response
    async fn write(&self, data: &[u8]) -> Result<(), TransportError>;
}
