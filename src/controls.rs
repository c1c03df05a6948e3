//! Control table - last observed value of each monitored CC knob
//!
//! Controls are addressed by name (`"CC <n>"`). The table has a fixed set of
//! entries for the whole session; only their values change.

use serde::Serialize;
use tracing::{debug, trace};

use crate::blemidi::{convert, ControlChange};

/// Observed value of a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "percent", rename_all = "lowercase")]
pub enum ControlValue {
    /// No message received since session start or last disconnect
    #[default]
    Unobserved,
    /// Last received value as a percentage (0-100)
    Observed(u8),
}

impl ControlValue {
    pub fn percent(&self) -> Option<u8> {
        match self {
            ControlValue::Observed(p) => Some(*p),
            ControlValue::Unobserved => None,
        }
    }
}

impl std::fmt::Display for ControlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlValue::Observed(p) => write!(f, "{}%", p),
            ControlValue::Unobserved => write!(f, "--"),
        }
    }
}

/// A named control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub name: String,
    pub value: ControlValue,
}

/// Name of the control bound to a controller number
pub fn control_name(controller: u8) -> String {
    format!("CC {}", controller)
}

/// Fixed, ordered set of controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlTable {
    controls: Vec<Control>,
}

impl ControlTable {
    /// Create a table with one control per controller number, in the given order
    pub fn new(controllers: &[u8]) -> Self {
        Self {
            controls: controllers
                .iter()
                .map(|&cc| Control {
                    name: control_name(cc),
                    value: ControlValue::Unobserved,
                })
                .collect(),
        }
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    /// Look up a control by name
    pub fn get(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    /// Apply one decoded message. Returns false if no control matches.
    pub fn apply(&mut self, cc: &ControlChange) -> bool {
        let name = control_name(cc.controller);
        match self.controls.iter_mut().find(|c| c.name == name) {
            Some(control) => {
                let percent = convert::percent_7bit(cc.value);
                control.value = ControlValue::Observed(percent);
                trace!(control = %control.name, raw = cc.value, percent, "Control updated");
                true
            }
            None => {
                debug!(controller = cc.controller, "Ignoring CC for unknown control");
                false
            }
        }
    }

    /// Apply a batch of decoded messages in order; returns how many matched
    pub fn apply_all(&mut self, messages: &[ControlChange]) -> usize {
        messages.iter().filter(|cc| self.apply(cc)).count()
    }

    /// Mark every control as unobserved
    pub fn reset(&mut self) {
        for control in &mut self.controls {
            control.value = ControlValue::Unobserved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ControlTable {
        ControlTable::new(&[1, 2, 3, 4, 5])
    }

    #[test]
    fn test_names_follow_convention() {
        let t = table();
        let names: Vec<_> = t.controls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CC 1", "CC 2", "CC 3", "CC 4", "CC 5"]);
        assert!(t.controls().iter().all(|c| c.value == ControlValue::Unobserved));
    }

    #[test]
    fn test_apply_maps_to_percent() {
        let mut t = table();
        assert!(t.apply(&ControlChange::new(1, 127)));
        assert!(t.apply(&ControlChange::new(2, 0)));
        assert!(t.apply(&ControlChange::new(3, 64)));

        assert_eq!(t.get("CC 1").unwrap().value, ControlValue::Observed(100));
        assert_eq!(t.get("CC 2").unwrap().value, ControlValue::Observed(0));
        assert_eq!(t.get("CC 3").unwrap().value, ControlValue::Observed(50));
        assert_eq!(t.get("CC 4").unwrap().value, ControlValue::Unobserved);
    }

    #[test]
    fn test_unknown_controller_is_dropped() {
        let mut t = table();
        let before = t.clone();
        assert!(!t.apply(&ControlChange::new(64, 10)));
        assert_eq!(t, before);
    }

    #[test]
    fn test_apply_all_counts_matches() {
        let mut t = table();
        let msgs = [
            ControlChange::new(1, 1),
            ControlChange::new(99, 1),
            ControlChange::new(1, 127),
        ];
        assert_eq!(t.apply_all(&msgs), 2);
        // Last message wins
        assert_eq!(t.get("CC 1").unwrap().value.percent(), Some(100));
    }

    #[test]
    fn test_high_bit_controller_leaves_table_untouched() {
        let mut t = table();
        let msgs = crate::blemidi::decode_packet(&[0x80, 0x80, 0xB0, 0x81, 0x7F]);
        assert_eq!(t.apply_all(&msgs), 0);
        assert_eq!(t.get("CC 1").unwrap().value, ControlValue::Unobserved);
    }

    #[test]
    fn test_reset() {
        let mut t = table();
        t.apply(&ControlChange::new(5, 100));
        t.reset();
        assert!(t.controls().iter().all(|c| c.value == ControlValue::Unobserved));
    }
}
