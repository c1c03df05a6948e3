//! Configuration management for the Mixy tuner
//!
//! Handles loading, parsing and validating the YAML configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::blemidi::{MIDI_CHARACTERISTIC_UUID, MIDI_SERVICE_UUIDS};
use crate::params::{ParamKey, ParamValues, Parameter};
use crate::session::DeviceInfo;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
}

/// Device identity and BLE-MIDI endpoints
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeviceConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_knobs")]
    pub knobs: u8,
    #[serde(default = "default_service_uuids")]
    pub service_uuids: Vec<String>,
    #[serde(default = "default_characteristic_uuid")]
    pub characteristic_uuid: String,
}

/// Controls to monitor
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ControlsConfig {
    /// Controller numbers, in display order
    #[serde(default = "default_controllers")]
    pub controllers: Vec<u8>,
}

/// Parameter settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ParametersConfig {
    /// Initial values, also used as the first last-sent snapshot
    #[serde(default)]
    pub defaults: ParamDefaults,
}

/// Initial parameter values
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct ParamDefaults {
    #[serde(default = "default_change_threshold")]
    pub change_threshold: u16,
    #[serde(default = "default_slow_interval")]
    pub slow_interval: u16,
    #[serde(default = "default_fast_interval")]
    pub fast_interval: u16,
    #[serde(default = "default_fast_timeout")]
    pub fast_timeout: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            knobs: default_knobs(),
            service_uuids: default_service_uuids(),
            characteristic_uuid: default_characteristic_uuid(),
        }
    }
}

impl DeviceConfig {
    /// Device identity reported when a connection is established
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            model: self.model.clone(),
            serial_number: "unknown".to_string(),
            knobs: self.knobs,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            controllers: default_controllers(),
        }
    }
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            change_threshold: default_change_threshold(),
            slow_interval: default_slow_interval(),
            fast_interval: default_fast_interval(),
            fast_timeout: default_fast_timeout(),
        }
    }
}

impl ParamDefaults {
    /// Values in buffer order
    pub fn values(&self) -> ParamValues {
        ParamValues([
            self.change_threshold,
            self.slow_interval,
            self.fast_interval,
            self.fast_timeout,
        ])
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate YAML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.device.knobs == 0 {
            anyhow::bail!("device.knobs must be at least 1");
        }
        if self.device.service_uuids.is_empty() {
            anyhow::bail!("device.service_uuids cannot be empty");
        }

        let controllers = &self.controls.controllers;
        if controllers.is_empty() {
            anyhow::bail!("At least one controller must be listed in controls.controllers");
        }
        let mut seen = HashSet::new();
        for &cc in controllers {
            if cc > 127 {
                anyhow::bail!("Controller number {} is invalid (must be 0-127)", cc);
            }
            if !seen.insert(cc) {
                anyhow::bail!("Controller number {} is listed twice", cc);
            }
        }

        let defaults = self.parameters.defaults.values();
        for &key in ParamKey::all() {
            let value = i32::from(defaults[key]);
            let param = Parameter::new(key, value);
            if !param.in_range(value) {
                anyhow::bail!(
                    "Default {} = {} is out of range (must be {}-{})",
                    key,
                    value,
                    param.min,
                    param.max
                );
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_model() -> String { "Mixy Beta".to_string() }
fn default_knobs() -> u8 { 5 }
fn default_service_uuids() -> Vec<String> { MIDI_SERVICE_UUIDS.iter().map(|s| s.to_string()).collect() }
fn default_characteristic_uuid() -> String { MIDI_CHARACTERISTIC_UUID.to_string() }
fn default_controllers() -> Vec<u8> { vec![1, 2, 3, 4, 5] }
fn default_change_threshold() -> u16 { ParamValues::DEFAULT[ParamKey::ChangeThreshold] }
fn default_slow_interval() -> u16 { ParamValues::DEFAULT[ParamKey::SlowInterval] }
fn default_fast_interval() -> u16 { ParamValues::DEFAULT[ParamKey::FastInterval] }
fn default_fast_timeout() -> u16 { ParamValues::DEFAULT[ParamKey::FastTimeout] }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.controls.controllers, vec![1, 2, 3, 4, 5]);
        assert_eq!(config.parameters.defaults.values(), ParamValues::DEFAULT);
        assert_eq!(config.device.service_uuids.len(), 2);
    }

    #[test]
    fn test_partial_config() {
        let yaml = r#"
device:
  model: "Mixy 2"
controls:
  controllers: [7, 10]
parameters:
  defaults:
    slow_interval: 500
"#;
        let config = AppConfig::parse(yaml).unwrap();
        assert_eq!(config.device.model, "Mixy 2");
        assert_eq!(config.device.knobs, 5);
        assert_eq!(config.controls.controllers, vec![7, 10]);
        assert_eq!(
            config.parameters.defaults.values(),
            ParamValues([10, 500, 90, 200])
        );
    }

    #[test]
    fn test_rejects_out_of_range_default() {
        let yaml = r#"
parameters:
  defaults:
    change_threshold: 150
"#;
        let err = AppConfig::parse(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("ChangeThreshold"));
    }

    #[test]
    fn test_rejects_bad_controllers() {
        assert!(AppConfig::parse("controls:\n  controllers: []\n").is_err());
        assert!(AppConfig::parse("controls:\n  controllers: [1, 1]\n").is_err());
        assert!(AppConfig::parse("controls:\n  controllers: [128]\n").is_err());
    }

    #[test]
    fn test_rejects_zero_knobs() {
        assert!(AppConfig::parse("device:\n  knobs: 0\n").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "controls:\n  controllers: [1, 2]\n")?;

        let config = AppConfig::load(&config_path).await?;
        assert_eq!(config.controls.controllers, vec![1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = AppConfig::load_or_default(temp_dir.path().join("missing.yaml")).await?;
        assert_eq!(config, AppConfig::default());
        assert!(AppConfig::load(temp_dir.path().join("missing.yaml")).await.is_err());
        Ok(())
    }
}
