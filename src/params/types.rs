//! Parameter type definitions
//!
//! `ParamKey` fixes each parameter's position in the outbound buffer, so
//! ordering never depends on how a collection happens to be laid out.

use serde::Serialize;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use super::error::ParamKeyError;

/// Number of tunable parameters
pub const PARAM_COUNT: usize = 4;

/// Tunable parameter, in buffer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParamKey {
    ChangeThreshold = 0,
    SlowInterval = 1,
    FastInterval = 2,
    FastTimeout = 3,
}

impl ParamKey {
    /// All keys in buffer order
    pub fn all() -> &'static [ParamKey; PARAM_COUNT] {
        &[
            ParamKey::ChangeThreshold,
            ParamKey::SlowInterval,
            ParamKey::FastInterval,
            ParamKey::FastTimeout,
        ]
    }

    /// Position in the parameter set
    pub fn index(self) -> usize {
        self as usize
    }

    /// Byte offset in the encoded buffer
    pub fn offset(self) -> usize {
        self.index() * 2
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::ChangeThreshold => "ChangeThreshold",
            ParamKey::SlowInterval => "SlowInterval",
            ParamKey::FastInterval => "FastInterval",
            ParamKey::FastTimeout => "FastTimeout",
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            ParamKey::ChangeThreshold => "Change Threshold",
            ParamKey::SlowInterval => "Slow Interval",
            ParamKey::FastInterval => "Fast Interval",
            ParamKey::FastTimeout => "Fast Timeout",
        }
    }

    /// Declared domain: (min, max, step)
    pub fn range(&self) -> (i32, i32, i32) {
        match self {
            ParamKey::ChangeThreshold => (1, 99, 1),
            ParamKey::SlowInterval => (300, 900, 25),
            ParamKey::FastInterval => (40, 150, 5),
            ParamKey::FastTimeout => (50, 600, 50),
        }
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = ParamKeyError;

    /// Accepts `ChangeThreshold`, `change_threshold` or `change-threshold`,
    /// any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        ParamKey::all()
            .iter()
            .copied()
            .find(|k| k.as_str().to_lowercase() == normalized)
            .ok_or_else(|| ParamKeyError(s.to_string()))
    }
}

/// Direction of a one-step nudge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Up,
    Down,
}

/// A tunable parameter with its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub key: ParamKey,
    pub label: &'static str,
    /// Current value; may be out of range until validated
    pub value: i32,
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

impl Parameter {
    /// Create a parameter with its declared domain and an initial value
    pub fn new(key: ParamKey, value: i32) -> Self {
        let (min, max, step) = key.range();
        Self {
            key,
            label: key.label(),
            value,
            min,
            max,
            step,
        }
    }

    /// Clamp the value into `[min, max]`. Returns true if it changed.
    pub fn clamp(&mut self) -> bool {
        let clamped = self.value.clamp(self.min, self.max);
        let changed = clamped != self.value;
        self.value = clamped;
        changed
    }

    pub fn in_range(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Move one step in `direction`, clamped to the bounds
    pub fn nudge(&mut self, direction: Nudge) {
        let delta = match direction {
            Nudge::Up => self.step,
            Nudge::Down => -self.step,
        };
        self.value = self.value.saturating_add(delta).clamp(self.min, self.max);
    }
}

/// One value per parameter, in buffer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamValues(pub [u16; PARAM_COUNT]);

impl ParamValues {
    /// Factory defaults
    pub const DEFAULT: ParamValues = ParamValues([10, 300, 90, 200]);
}

impl Default for ParamValues {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Index<ParamKey> for ParamValues {
    type Output = u16;

    fn index(&self, key: ParamKey) -> &u16 {
        &self.0[key.index()]
    }
}

impl IndexMut<ParamKey> for ParamValues {
    fn index_mut(&mut self, key: ParamKey) -> &mut u16 {
        &mut self.0[key.index()]
    }
}

impl std::fmt::Display for ParamValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = ParamKey::all()
            .iter()
            .map(|k| format!("{}={}", k, self[*k]))
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_offsets() {
        let offsets: Vec<_> = ParamKey::all().iter().map(|k| k.offset()).collect();
        assert_eq!(offsets, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!("SlowInterval".parse::<ParamKey>().unwrap(), ParamKey::SlowInterval);
        assert_eq!("fast_timeout".parse::<ParamKey>().unwrap(), ParamKey::FastTimeout);
        assert_eq!("change-threshold".parse::<ParamKey>().unwrap(), ParamKey::ChangeThreshold);
        assert!("Volume".parse::<ParamKey>().is_err());
    }

    #[test]
    fn test_nudge_clamps() {
        let mut p = Parameter::new(ParamKey::SlowInterval, 890);
        p.nudge(Nudge::Up);
        assert_eq!(p.value, 900);
        p.nudge(Nudge::Up);
        assert_eq!(p.value, 900);

        let mut p = Parameter::new(ParamKey::FastTimeout, 50);
        p.nudge(Nudge::Down);
        assert_eq!(p.value, 50);
        p.nudge(Nudge::Up);
        assert_eq!(p.value, 100);
    }

    #[test]
    fn test_clamp_reports_change() {
        let mut p = Parameter::new(ParamKey::ChangeThreshold, 150);
        assert!(p.clamp());
        assert_eq!(p.value, 99);
        assert!(!p.clamp());
    }

    #[test]
    fn test_values_display() {
        assert_eq!(
            ParamValues::DEFAULT.to_string(),
            "ChangeThreshold=10, SlowInterval=300, FastInterval=90, FastTimeout=200"
        );
    }
}
