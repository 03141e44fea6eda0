use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::geo::GeoPoint;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Station configuration, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Antenna location. Optional so the program can come up before the
    /// operator has surveyed in; tracking waits until it is set.
    #[serde(default)]
    pub ground: Option<GroundConfig>,
    pub telemetry: TelemetryConfig,
    pub rotator: RotatorConfig,
    #[serde(default)]
    pub control: ControlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: Option<f64>,
}

impl GroundConfig {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude, self.altitude_m)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub port: String,
    #[serde(default = "default_telemetry_baud")]
    pub baud: u32,
    /// Append-only log of accepted raw payloads.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotatorConfig {
    pub port: String,
    #[serde(default = "default_rotator_baud")]
    pub baud: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_period", deserialize_with = "parse_period")]
    pub period: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
        }
    }
}

fn default_telemetry_baud() -> u32 {
    crate::telemetry::DEFAULT_BAUD
}

fn default_rotator_baud() -> u32 {
    crate::rotator::DEFAULT_BAUD
}

fn default_period() -> Duration {
    crate::control::DEFAULT_PERIOD
}

fn parse_period<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let yaml = r#"
ground:
  latitude: 32.940058
  longitude: -106.921903
  altitude_m: 1381.0
telemetry:
  port: /dev/ttyUSB0
  log_file: telemetry.log
rotator:
  port: /dev/ttyUSB1
control:
  period: 250ms
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let ground = config.ground.unwrap().position();
        assert_eq!(ground.altitude_m, Some(1381.0));
        assert_eq!(config.telemetry.baud, 57_600);
        assert_eq!(config.rotator.baud, 115_200);
        assert_eq!(config.control.period, Duration::from_millis(250));
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let yaml = r#"
telemetry:
  port: COM4
rotator:
  port: COM5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.ground.is_none());
        assert!(config.telemetry.log_file.is_none());
        assert_eq!(config.control.period, Duration::from_millis(500));
    }
}
