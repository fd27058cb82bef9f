//! Configuration loading for MargaNav

use crate::error::{MargaError, Result};
use crate::navigation::NavigatorConfig;
use crate::sensors::ThreeWheelGeometry;
use crate::sim::SimConfig;
use serde::Deserialize;
use std::path::Path;

/// Log filter used while navigation debugging is on.
pub const DEBUG_LOG_FILTER: &str = "debug";

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MargaConfig {
    #[serde(default)]
    pub navigation: NavigatorConfig,
    #[serde(default)]
    pub odometry: ThreeWheelGeometry,
    #[serde(default)]
    pub simulation: SimConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Waypoints the headless runner feeds, in order
    #[serde(default)]
    pub route: Vec<RouteWaypoint>,
}

/// Logging settings
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One `[[route]]` entry
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RouteWaypoint {
    pub x: f64,
    pub y: f64,
    /// Heading in degrees (default: 0)
    #[serde(default)]
    pub heading_deg: f64,
}

impl MargaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MargaError::Config(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Default log filter for the binary.
    ///
    /// Navigation debugging prints every tick, which the loop logs at
    /// `debug`, so it lowers the filter to `debug`. Otherwise
    /// `[logging] level` applies. `RUST_LOG` still overrides either.
    pub fn log_filter(&self) -> &str {
        if self.navigation.debug {
            DEBUG_LOG_FILTER
        } else {
            &self.logging.level
        }
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: MargaConfig = toml::from_str(content)?;
        config.odometry.validate()?;
        Ok(config)
    }
}
