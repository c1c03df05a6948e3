//! Parameter set - the four tunable values, validation and change detection

use serde::Serialize;
use std::ops::Index;
use tracing::warn;

use super::types::{Nudge, ParamKey, ParamValues, Parameter, PARAM_COUNT};

/// Fixed set of tunable parameters, indexed by `ParamKey`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    params: [Parameter; PARAM_COUNT],
}

impl ParameterSet {
    /// Create the set with each value initialised from `initial`
    pub fn new(initial: &ParamValues) -> Self {
        let keys = *ParamKey::all();
        Self {
            params: keys.map(|key| Parameter::new(key, i32::from(initial[key]))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn get(&self, key: ParamKey) -> &Parameter {
        &self.params[key.index()]
    }

    /// Set a raw value. No clamping; `validate` runs before encoding.
    pub fn set(&mut self, key: ParamKey, value: i32) {
        self.params[key.index()].value = value;
    }

    /// Move a parameter one step up or down, clamped
    pub fn nudge(&mut self, key: ParamKey, direction: Nudge) -> i32 {
        let param = &mut self.params[key.index()];
        param.nudge(direction);
        param.value
    }

    /// Clamp every value into its bounds. Returns the keys that were adjusted.
    pub fn validate(&mut self) -> Vec<ParamKey> {
        let mut adjusted = Vec::new();
        for param in &mut self.params {
            let before = param.value;
            if param.clamp() {
                warn!(
                    param = %param.key,
                    from = before,
                    to = param.value,
                    "Parameter clamped into range"
                );
                adjusted.push(param.key);
            }
        }
        adjusted
    }

    /// True if every value is within its bounds
    pub fn is_valid(&self) -> bool {
        self.params.iter().all(|p| p.in_range(p.value))
    }

    /// True if any value differs from `last_sent` at the same position
    pub fn differs_from(&self, last_sent: &ParamValues) -> bool {
        self.params
            .iter()
            .any(|p| p.value != i32::from(last_sent[p.key]))
    }

    /// `key=value` summary for logs
    pub fn summary(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}={}", p.key, p.value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new(&ParamValues::DEFAULT)
    }
}

impl Index<ParamKey> for ParameterSet {
    type Output = Parameter;

    fn index(&self, key: ParamKey) -> &Parameter {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialised_from_defaults() {
        let set = ParameterSet::default();
        assert_eq!(set[ParamKey::ChangeThreshold].value, 10);
        assert_eq!(set[ParamKey::SlowInterval].value, 300);
        assert_eq!(set[ParamKey::FastInterval].value, 90);
        assert_eq!(set[ParamKey::FastTimeout].value, 200);
        assert!(set.is_valid());
    }

    #[test]
    fn test_validate_clamps() {
        let mut set = ParameterSet::default();
        set.set(ParamKey::ChangeThreshold, 150);
        set.set(ParamKey::SlowInterval, 100);
        assert!(!set.is_valid());

        let adjusted = set.validate();
        assert_eq!(adjusted, vec![ParamKey::ChangeThreshold, ParamKey::SlowInterval]);
        assert_eq!(set[ParamKey::ChangeThreshold].value, 99);
        assert_eq!(set[ParamKey::SlowInterval].value, 300);
        assert!(set.is_valid());
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut set = ParameterSet::default();
        set.set(ParamKey::FastInterval, -5);
        set.validate();
        let once = set.clone();
        assert!(set.validate().is_empty());
        assert_eq!(set, once);
    }

    #[test]
    fn test_differs_from() {
        let mut set = ParameterSet::default();
        assert!(!set.differs_from(&ParamValues::DEFAULT));

        set.set(ParamKey::FastTimeout, 250);
        assert!(set.differs_from(&ParamValues::DEFAULT));

        set.set(ParamKey::FastTimeout, 200);
        assert!(!set.differs_from(&ParamValues::DEFAULT));
    }

    #[test]
    fn test_differs_from_is_positional() {
        // Same multiset of values, different positions
        let set = ParameterSet::new(&ParamValues([90, 300, 10, 200]));
        assert!(set.differs_from(&ParamValues::DEFAULT));
    }

    #[test]
    fn test_nudge() {
        let mut set = ParameterSet::default();
        assert_eq!(set.nudge(ParamKey::SlowInterval, Nudge::Up), 325);
        assert_eq!(set.nudge(ParamKey::FastInterval, Nudge::Down), 85);
    }
}
