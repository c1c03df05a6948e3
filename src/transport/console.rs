//! Console transport - logs every outbound write instead of sending it

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Transport, TransportError};
use crate::blemidi::format_hex;
use crate::params;

/// ConsoleTransport logs parameter buffers to the console/logs
///
/// Useful for checking what would be written to the device without a BLE
/// link. Every write succeeds and is kept for inspection.
pub struct ConsoleTransport {
    name: String,
    writes: Mutex<Vec<Vec<u8>>>,
}

impl ConsoleTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Number of buffers written so far
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    /// Most recent buffer written, if any
    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.lock().last().cloned()
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let write_num = {
            let mut writes = self.writes.lock();
            writes.push(data.to_vec());
            writes.len()
        };

        let decoded = params::decode(data)
            .map(|v| v.to_string())
            .unwrap_or_else(|e| e.to_string());

        info!(
            "📤 [{}] Transport '{}' ← {} ({}) [write #{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            self.name,
            format_hex(data),
            decoded,
            write_num
        );

        debug!(
            transport = self.name,
            len = data.len(),
            write_count = write_num,
            "ConsoleTransport write"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_transport_records_writes() {
        let transport = ConsoleTransport::new("test");
        assert_eq!(transport.name(), "test");
        assert_eq!(transport.write_count(), 0);

        let buffer = [0x0A, 0x00, 0x2C, 0x01, 0x5A, 0x00, 0xC8, 0x00];
        transport.write(&buffer).await.unwrap();
        transport.write(&[0x01]).await.unwrap();

        assert_eq!(transport.write_count(), 2);
        assert_eq!(transport.last_write(), Some(vec![0x01]));
    }
}
