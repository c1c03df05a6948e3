//! BLE-MIDI packet framing
//!
//! Strips the BLE-MIDI header/timestamp framing from a notification payload
//! and extracts the embedded Control Change messages. Everything that is not
//! a Control Change is skipped.

use std::fmt;
use tracing::trace;

/// BLE-MIDI service UUIDs. The first is the standard service every device
/// advertises, the second is the alternate service exposed by Mixy firmware.
pub const MIDI_SERVICE_UUIDS: [&str; 2] = [
    "03b80e5a-ede8-4b33-a751-6ce34ec4c700",
    "03b80e5a-ede8-4b33-a751-6ce34ec4c705",
];

/// BLE-MIDI I/O characteristic (notifications in, writes out)
pub const MIDI_CHARACTERISTIC_UUID: &str = "7772e5db-3868-4112-a1a9-f2669d106bf3";

/// Status nibble of a Control Change message
const STATUS_CONTROL_CHANGE: u8 = 0xB0;

/// Bytes in an embedded channel message (status, data1, data2)
const MESSAGE_LEN: usize = 3;

/// A decoded Control Change message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChange {
    /// MIDI channel (0-15). Carried for logging, not used for mapping.
    pub channel: u8,
    /// Controller number (0-127)
    pub controller: u8,
    /// 7-bit value (0-127)
    pub value: u8,
}

impl ControlChange {
    pub fn new(controller: u8, value: u8) -> Self {
        Self {
            channel: 0,
            controller,
            value,
        }
    }
}

impl fmt::Display for ControlChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CC ch:{} cc:{} v:{}",
            self.channel + 1,
            self.controller,
            self.value
        )
    }
}

/// Returns true if the high bit of `byte` is set
#[inline]
fn is_framing_byte(byte: u8) -> bool {
    byte & 0x80 != 0
}

/// Decode one BLE-MIDI notification payload into Control Change messages.
///
/// Malformed input never fails: a missing header drops the whole packet, a
/// truncated trailing message ends decoding while keeping what was already
/// decoded, stray data bytes are skipped, and a CC whose data bytes are not
/// 7-bit is dropped.
pub fn decode_packet(packet: &[u8]) -> Vec<ControlChange> {
    let mut out = Vec::new();

    match packet.first() {
        Some(&header) if is_framing_byte(header) => {}
        _ => {
            trace!(len = packet.len(), "Dropping packet without header byte");
            return out;
        }
    }

    let mut i = 1;
    while i < packet.len() {
        if !is_framing_byte(packet[i]) {
            trace!(offset = i, byte = packet[i], "Skipping stray byte");
            i += 1;
            continue;
        }

        // Timestamp byte
        i += 1;
        if packet.len() - i < MESSAGE_LEN {
            trace!(offset = i, "Incomplete trailing message");
            break;
        }

        let status = packet[i];
        let data1 = packet[i + 1];
        let data2 = packet[i + 2];
        i += MESSAGE_LEN;

        if status & 0xF0 != STATUS_CONTROL_CHANGE {
            continue;
        }
        if is_framing_byte(data1) || is_framing_byte(data2) {
            trace!(data1, data2, "Dropping CC with out-of-range data byte");
            continue;
        }
        out.push(ControlChange {
            channel: status & 0x0F,
            controller: data1,
            value: data2,
        });
    }

    out
}

/// Build a well-formed BLE-MIDI packet carrying `messages`.
///
/// Each message gets its own timestamp byte; the 13-bit millisecond
/// timestamp is split between the header (high 6 bits) and timestamp byte
/// (low 7 bits) as the BLE-MIDI profile specifies.
pub fn encode_cc_packet(timestamp_ms: u16, messages: &[ControlChange]) -> Vec<u8> {
    let ts = timestamp_ms & 0x1FFF;
    let header = 0x80 | ((ts >> 7) as u8 & 0x3F);
    let ts_low = 0x80 | (ts as u8 & 0x7F);

    let mut packet = Vec::with_capacity(1 + messages.len() * (MESSAGE_LEN + 1));
    packet.push(header);
    for msg in messages {
        packet.push(ts_low);
        packet.push(STATUS_CONTROL_CHANGE | (msg.channel & 0x0F));
        packet.push(msg.controller & 0x7F);
        packet.push(msg.value & 0x7F);
    }
    packet
}

/// MIDI value conversion utilities
pub mod convert {
    /// Convert 7-bit value to percentage (0-100)
    pub fn to_percent_7bit(value: u8) -> f32 {
        (value as f32 * 100.0) / 127.0
    }

    /// Convert 7-bit value to a whole percentage, rounded to nearest
    pub fn percent_7bit(value: u8) -> u8 {
        to_percent_7bit(value.min(127)).round() as u8
    }
}

/// Format bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a notification and its decoded messages for sniffer output
pub fn format_packet(timestamp_ms: u64, data: &[u8]) -> String {
    let decoded = decode_packet(data);
    let messages = if decoded.is_empty() {
        String::new()
    } else {
        let parts = decoded.iter().map(|m| m.to_string()).collect::<Vec<_>>();
        format!(" => {}", parts.join(", "))
    };

    format!("[{:08}ms] {}{}", timestamp_ms, format_hex(data), messages)
}
