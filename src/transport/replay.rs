//! Replay source - feeds recorded notifications into a session
//!
//! File format: one hex-encoded notification per line. Bytes may be separated
//! by spaces or colons. Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::session::SessionActorHandle;

/// Parse one line of hex into raw bytes. Returns `Ok(None)` for blank or
/// comment lines.
pub fn parse_hex_line(line: &str) -> Result<Option<Vec<u8>>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let compact = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);

    let bytes = hex::decode(compact).with_context(|| format!("Invalid hex packet: {}", trimmed))?;
    Ok(Some(bytes))
}

/// Recorded notifications loaded from a file
#[derive(Debug, Clone)]
pub struct ReplaySource {
    packets: Vec<Vec<u8>>,
}

impl ReplaySource {
    pub fn new(packets: Vec<Vec<u8>>) -> Self {
        Self { packets }
    }

    /// Load a replay file. Unparseable lines are skipped with a warning.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read replay file: {}", path.display()))?;

        let mut packets = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            match parse_hex_line(line) {
                Ok(Some(bytes)) => packets.push(bytes),
                Ok(None) => {}
                Err(e) => warn!(line = line_no + 1, "Skipping replay line: {:#}", e),
            }
        }

        info!(count = packets.len(), "Loaded replay file {}", path.display());
        Ok(Self { packets })
    }

    pub fn packets(&self) -> &[Vec<u8>] {
        &self.packets
    }

    /// Push every packet into the session, in order, pausing `delay` between
    /// packets. Stops early if the session has shut down.
    pub async fn run(&self, session: &SessionActorHandle, delay: Duration) -> usize {
        let mut sent = 0;
        for packet in &self.packets {
            if !session.is_alive() {
                warn!("Session closed, stopping replay");
                break;
            }
            session.notify(packet.clone());
            sent += 1;
            debug!(sent, "Replayed packet");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        sent
    }
}
