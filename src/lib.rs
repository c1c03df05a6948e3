//! Mixy BLE-MIDI tuner
//!
//! Decodes BLE-MIDI notifications from a Mixy controller into knob positions
//! and encodes its tuning parameters into the 8-byte buffer the firmware
//! expects.

pub mod blemidi;
pub mod cli;
pub mod config;
pub mod controls;
pub mod params;
pub mod session;
pub mod sniffer;
pub mod transport;
