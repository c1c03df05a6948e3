//! Session state - controls, parameters and the last-sent snapshot
//!
//! One `Session` exists per connection to a device. It is owned by the
//! session actor; nothing else mutates it.

use serde::Serialize;
use tracing::{debug, info};

use crate::blemidi::{self, format_hex};
use crate::controls::{Control, ControlTable};
use crate::params::{self, EncodeError, Nudge, ParamKey, ParamValues, Parameter, ParameterSet, BUFFER_LEN};

/// Identity of the connected device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub model: String,
    pub serial_number: String,
    /// Number of physical knobs
    pub knobs: u8,
}

/// Result of a successful encode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Values now recorded as last sent
    pub values: ParamValues,
    /// Buffer for the transport
    pub buffer: [u8; BUFFER_LEN],
}

/// Point-in-time copy of the session for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
    pub controls: Vec<Control>,
    pub params: Vec<Parameter>,
    pub last_sent: ParamValues,
    pub pending_changes: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    controls: ControlTable,
    params: ParameterSet,
    last_sent: ParamValues,
    device: Option<DeviceInfo>,
}

impl Session {
    /// Create a session watching `controllers`, with parameters and the
    /// last-sent snapshot both initialised from `defaults`
    pub fn new(controllers: &[u8], defaults: ParamValues) -> Self {
        Self {
            controls: ControlTable::new(controllers),
            params: ParameterSet::new(&defaults),
            last_sent: defaults,
            device: None,
        }
    }

    pub fn controls(&self) -> &ControlTable {
        &self.controls
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn last_sent(&self) -> &ParamValues {
        &self.last_sent
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    /// Decode one notification and update matching controls.
    /// Returns the number of controls updated.
    pub fn on_notification(&mut self, packet: &[u8]) -> usize {
        let messages = blemidi::decode_packet(packet);
        let updated = self.controls.apply_all(&messages);
        debug!(
            packet = %format_hex(packet),
            decoded = messages.len(),
            updated,
            "Notification processed"
        );
        updated
    }

    /// Set a parameter without clamping; validation happens on apply
    pub fn set_param(&mut self, key: ParamKey, value: i32) {
        self.params.set(key, value);
    }

    /// Move a parameter one step, clamped. Returns the new value.
    pub fn nudge_param(&mut self, key: ParamKey, direction: Nudge) -> i32 {
        self.params.nudge(key, direction)
    }

    /// True if the current parameters differ from the last-sent snapshot
    pub fn params_changed(&self) -> bool {
        self.params.differs_from(&self.last_sent)
    }

    /// Validate, encode and commit the parameters.
    ///
    /// Returns `Ok(None)` when the validated values match the last-sent
    /// snapshot and `force` is not set. Otherwise the snapshot is replaced as
    /// soon as encoding succeeds; whether the buffer ever reaches the device
    /// is the caller's concern.
    pub fn apply(&mut self, force: bool) -> Result<Option<Applied>, EncodeError> {
        self.params.validate();
        if !force && !self.params_changed() {
            return Ok(None);
        }

        let encoded = params::encode(&self.params)?;
        self.last_sent = encoded.values;

        info!("Sent MixyParams: {}", self.params.summary());

        Ok(Some(Applied {
            values: encoded.values,
            buffer: encoded.buffer,
        }))
    }

    pub fn connect(&mut self, device: DeviceInfo) {
        info!(model = %device.model, knobs = device.knobs, "Device connected");
        self.device = Some(device);
    }

    /// Forget the device and mark every control unobserved
    pub fn disconnect(&mut self) {
        if self.device.take().is_some() {
            info!("Device disconnected");
        }
        self.controls.reset();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connected: self.is_connected(),
            device: self.device.clone(),
            controls: self.controls.controls().to_vec(),
            params: self.params.iter().copied().collect(),
            last_sent: self.last_sent,
            pending_changes: self.params_changed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::ControlValue;

    fn session() -> Session {
        Session::new(&[1, 2, 3, 4, 5], ParamValues::DEFAULT)
    }

    fn device() -> DeviceInfo {
        DeviceInfo {
            model: "Mixy Beta".to_string(),
            serial_number: "unknown".to_string(),
            knobs: 5,
        }
    }

    #[test]
    fn test_notification_updates_control() {
        let mut s = session();
        assert_eq!(s.on_notification(&[0x80, 0x80, 0xB0, 0x01, 0x7F]), 1);
        assert_eq!(
            s.controls().get("CC 1").unwrap().value,
            ControlValue::Observed(100)
        );
    }

    #[test]
    fn test_malformed_notification_changes_nothing() {
        let mut s = session();
        assert_eq!(s.on_notification(&[0x00, 0x80, 0xB0, 0x01, 0x7F]), 0);
        assert!(s
            .controls()
            .controls()
            .iter()
            .all(|c| c.value == ControlValue::Unobserved));
    }

    #[test]
    fn test_apply_commits_validated_values() {
        let mut s = session();
        s.set_param(ParamKey::ChangeThreshold, 150);
        s.set_param(ParamKey::SlowInterval, 100);
        assert!(s.params_changed());

        let applied = s.apply(false).unwrap().unwrap();
        assert_eq!(applied.values, ParamValues([99, 300, 90, 200]));
        assert_eq!(*s.last_sent(), ParamValues([99, 300, 90, 200]));
        assert!(!s.params_changed());
    }

    #[test]
    fn test_apply_gates_on_validated_values() {
        let mut s = session();
        // Clamps back to the default that was last sent
        s.set_param(ParamKey::SlowInterval, 100);
        assert!(s.params_changed());

        assert_eq!(s.apply(false).unwrap(), None);
        assert_eq!(s.params()[ParamKey::SlowInterval].value, 300);
        assert_eq!(*s.last_sent(), ParamValues::DEFAULT);

        let forced = s.apply(true).unwrap().unwrap();
        assert_eq!(forced.values, ParamValues::DEFAULT);
    }

    #[test]
    fn test_apply_without_device_still_commits() {
        let mut s = session();
        assert!(!s.is_connected());
        s.set_param(ParamKey::FastTimeout, 400);
        s.apply(false).unwrap();
        assert_eq!(s.last_sent()[ParamKey::FastTimeout], 400);
    }

    #[test]
    fn test_apply_defaults_buffer() {
        let mut s = session();
        let applied = s.apply(true).unwrap().unwrap();
        assert_eq!(
            applied.buffer,
            [0x0A, 0x00, 0x2C, 0x01, 0x5A, 0x00, 0xC8, 0x00]
        );
    }

    #[test]
    fn test_disconnect_resets_controls() {
        let mut s = session();
        s.connect(device());
        s.on_notification(&[0x80, 0x80, 0xB0, 0x02, 0x40]);
        assert!(s.is_connected());

        s.disconnect();
        assert!(!s.is_connected());
        assert!(s.device().is_none());
        assert!(s
            .controls()
            .controls()
            .iter()
            .all(|c| c.value == ControlValue::Unobserved));
    }

    #[test]
    fn test_snapshot() {
        let mut s = session();
        s.nudge_param(ParamKey::FastInterval, Nudge::Up);
        let snap = s.snapshot();
        assert!(!snap.connected);
        assert!(snap.pending_changes);
        assert_eq!(snap.controls.len(), 5);
        assert_eq!(snap.params[ParamKey::FastInterval.index()].value, 95);
        assert_eq!(snap.last_sent, ParamValues::DEFAULT);
    }
}
