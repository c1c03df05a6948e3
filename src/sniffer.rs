//! Packet sniffer for debugging and development
//!
//! Reads hex-encoded traffic from stdin and prints what the tuner would make
//! of it. Lines prefixed with `>` are outbound parameter buffers; every other
//! line is an inbound BLE-MIDI notification.

use anyhow::Result;
use colored::*;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::blemidi::{format_hex, format_packet};
use crate::params;
use crate::transport::replay::parse_hex_line;

/// Direction of a sniffed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn display(&self) -> ColoredString {
        match self {
            Direction::Input => "IN ".green(),
            Direction::Output => "OUT".red(),
        }
    }
}

/// Split the direction marker off a sniffer line
pub fn split_direction(line: &str) -> (Direction, &str) {
    match line.trim_start().strip_prefix('>') {
        Some(rest) => (Direction::Output, rest),
        None => (Direction::Input, line),
    }
}

/// Describe one sniffed line, or None for blank/comment lines
pub fn describe_line(timestamp_ms: u64, line: &str) -> Option<String> {
    let (direction, payload) = split_direction(line);
    let bytes = match parse_hex_line(payload) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => return Some(format!("{} {}", "ERR".yellow(), e)),
    };

    let body = match direction {
        Direction::Input => {
            let line = format_packet(timestamp_ms, &bytes);
            if line.contains("=>") {
                line
            } else {
                format!("{} {}", line, "(no control changes)".dimmed())
            }
        }
        Direction::Output => {
            let decoded = params::decode(&bytes)
                .map(|v| v.to_string())
                .unwrap_or_else(|e| e.to_string());
            format!("[{:08}ms] {} => {}", timestamp_ms, format_hex(&bytes), decoded)
        }
    };

    Some(format!("{} {}", direction.display(), body))
}

/// Print a description of every line read from `reader`
pub async fn sniff<R: AsyncBufRead + Unpin>(reader: R) -> Result<usize> {
    let start = Instant::now();
    let mut lines = reader.lines();
    let mut count = 0;

    while let Some(line) = lines.next_line().await? {
        let ts = start.elapsed().as_millis() as u64;
        if let Some(out) = describe_line(ts, &line) {
            println!("{}", out);
            count += 1;
        }
    }

    Ok(count)
}

/// CLI sniffer over stdin
pub async fn run_cli_sniffer() -> Result<()> {
    println!("{}", "=== BLE-MIDI Sniffer ===".bold().cyan());
    println!("Paste hex packets, one per line ('>' prefix for parameter buffers). Ctrl+D to exit\n");

    let count = sniff(BufReader::new(tokio::io::stdin())).await?;

    println!("\n{} {} buffers", "Sniffed".bold(), count);
    Ok(())
}
