use crate::error::{Result, TaskmapError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Highest zoom level the map supports
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// Task count above which individual fetches are escalated to clusters
pub const DEFAULT_UNCLUSTER_THRESHOLD: usize = 1000;

/// Widest viewport (in degrees) that may be queried without a scope id
pub const DEFAULT_MAX_ALLOWED_DEGREES: f64 = 70.0;

/// Coalescing window for free-text search refetches
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 400;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Tunables consumed by the query planner and fetch coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    pub max_zoom: u8,
    pub uncluster_threshold: usize,
    pub max_allowed_degrees: f64,
    pub search_debounce: Duration,
    /// Keep every committed individual-task result for reuse elsewhere
    pub persist_results: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_zoom: DEFAULT_MAX_ZOOM,
            uncluster_threshold: DEFAULT_UNCLUSTER_THRESHOLD,
            max_allowed_degrees: DEFAULT_MAX_ALLOWED_DEGREES,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            persist_results: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_persist_results(mut self, persist: bool) -> Self {
        self.persist_results = persist;
        self
    }
}

/// Layered configuration for TaskMap
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub max_zoom: ConfigValue<u8>,
    pub uncluster_threshold: ConfigValue<usize>,
    pub max_allowed_degrees: ConfigValue<f64>,
    pub search_debounce_ms: ConfigValue<u64>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            max_zoom: ConfigValue::new(DEFAULT_MAX_ZOOM, ConfigSource::Default),
            uncluster_threshold: ConfigValue::new(
                DEFAULT_UNCLUSTER_THRESHOLD,
                ConfigSource::Default,
            ),
            max_allowed_degrees: ConfigValue::new(
                DEFAULT_MAX_ALLOWED_DEGREES,
                ConfigSource::Default,
            ),
            search_debounce_ms: ConfigValue::new(
                DEFAULT_SEARCH_DEBOUNCE_MS,
                ConfigSource::Default,
            ),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| TaskmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| TaskmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(max_zoom) = file_config.max_zoom {
            self.max_zoom.update(max_zoom, ConfigSource::File);
        }

        if let Some(threshold) = file_config.uncluster_threshold {
            self.uncluster_threshold.update(threshold, ConfigSource::File);
        }

        if let Some(degrees) = file_config.max_allowed_degrees {
            self.max_allowed_degrees.update(degrees, ConfigSource::File);
        }

        if let Some(debounce) = file_config.search_debounce_ms {
            self.search_debounce_ms.update(debounce, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Some(max_zoom) = env_value::<u8>("TASKMAP_MAX_ZOOM", "integer zoom level") {
            self.max_zoom.update(max_zoom, ConfigSource::Environment);
        }

        if let Some(threshold) =
            env_value::<usize>("TASKMAP_UNCLUSTER_THRESHOLD", "non-negative task count")
        {
            self.uncluster_threshold.update(threshold, ConfigSource::Environment);
        }

        if let Some(degrees) = env_value::<f64>("TASKMAP_MAX_ALLOWED_DEGREES", "number of degrees")
        {
            self.max_allowed_degrees.update(degrees, ConfigSource::Environment);
        }

        if let Some(debounce) =
            env_value::<u64>("TASKMAP_SEARCH_DEBOUNCE_MS", "duration in milliseconds")
        {
            self.search_debounce_ms.update(debounce, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(max_zoom) = overrides.max_zoom {
            self.max_zoom.update(max_zoom, ConfigSource::Cli);
        }

        if let Some(threshold) = overrides.uncluster_threshold {
            self.uncluster_threshold.update(threshold, ConfigSource::Cli);
        }

        if let Some(degrees) = overrides.max_allowed_degrees {
            self.max_allowed_degrees.update(degrees, ConfigSource::Cli);
        }

        if let Some(debounce) = overrides.search_debounce_ms {
            self.search_debounce_ms.update(debounce, ConfigSource::Cli);
        }
    }

    /// Check that the effective values are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_zoom.value == 0 {
            return Err(TaskmapError::ConfigInvalid {
                key: "max_zoom".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let degrees = self.max_allowed_degrees.value;
        if !degrees.is_finite() || degrees <= 0.0 || degrees > 360.0 {
            return Err(TaskmapError::ConfigInvalid {
                key: "max_allowed_degrees".to_string(),
                reason: format!("{} is outside (0, 360]", degrees),
            });
        }

        Ok(())
    }

    /// Tunables for the fetch coordinator
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_zoom: self.max_zoom.value,
            uncluster_threshold: self.uncluster_threshold.value,
            max_allowed_degrees: self.max_allowed_degrees.value,
            search_debounce: Duration::from_millis(self.search_debounce_ms.value),
            persist_results: false,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "max_zoom".to_string(),
            (self.max_zoom.value.to_string(), self.max_zoom.source),
        );

        map.insert(
            "uncluster_threshold".to_string(),
            (self.uncluster_threshold.value.to_string(), self.uncluster_threshold.source),
        );

        map.insert(
            "max_allowed_degrees".to_string(),
            (format!("{}°", self.max_allowed_degrees.value), self.max_allowed_degrees.source),
        );

        map.insert(
            "search_debounce_ms".to_string(),
            (format!("{}ms", self.search_debounce_ms.value), self.search_debounce_ms.source),
        );

        map
    }
}

/// Read and parse an environment variable, warning on malformed values
fn env_value<T>(key: &str, expected: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Invalid {} value '{}': expected {} ({})", key, raw, expected, e);
            None
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    max_zoom: Option<u8>,
    uncluster_threshold: Option<usize>,
    max_allowed_degrees: Option<f64>,
    search_debounce_ms: Option<u64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub max_zoom: Option<u8>,
    pub uncluster_threshold: Option<usize>,
    pub max_allowed_degrees: Option<f64>,
    pub search_debounce_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.max_zoom.value, 18);
        assert_eq!(config.max_zoom.source, ConfigSource::Default);
        assert_eq!(config.uncluster_threshold.value, 1000);
        assert_eq!(config.max_allowed_degrees.value, 70.0);
        assert_eq!(config.search_debounce_ms.value, 400);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);
        assert_eq!(value.source, ConfigSource::Environment);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
max_zoom = 16
uncluster_threshold = 250
max_allowed_degrees = 45.5
search_debounce_ms = 800
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.max_zoom.value, 16);
        assert_eq!(config.max_zoom.source, ConfigSource::File);
        assert_eq!(config.uncluster_threshold.value, 250);
        assert_eq!(config.max_allowed_degrees.value, 45.5);
        assert_eq!(config.search_debounce_ms.value, 800);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        let overrides = CliConfigOverrides {
            max_zoom: Some(20),
            uncluster_threshold: None,
            max_allowed_degrees: Some(10.0),
            search_debounce_ms: None,
        };

        config.update_from_cli(overrides);

        assert_eq!(config.max_zoom.value, 20);
        assert_eq!(config.max_zoom.source, ConfigSource::Cli);
        assert_eq!(config.max_allowed_degrees.value, 10.0);
        assert_eq!(config.uncluster_threshold.source, ConfigSource::Default);
        assert_eq!(config.search_debounce_ms.source, ConfigSource::Default);
    }

    #[test]
    fn test_validate() {
        let mut config = LayeredConfig::with_defaults();
        assert!(config.validate().is_ok());

        config.max_allowed_degrees.update(0.0, ConfigSource::Cli);
        assert!(config.validate().is_err());

        let mut config = LayeredConfig::with_defaults();
        config.max_zoom.update(0, ConfigSource::Cli);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_coordinator_config() {
        let mut config = LayeredConfig::with_defaults();
        config.search_debounce_ms.update(150, ConfigSource::Cli);

        let coordinator = config.coordinator_config();
        assert_eq!(coordinator.max_zoom, 18);
        assert_eq!(coordinator.uncluster_threshold, 1000);
        assert_eq!(coordinator.search_debounce, Duration::from_millis(150));
        assert!(!coordinator.persist_results);
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert!(map.contains_key("max_zoom"));
        assert!(map.contains_key("uncluster_threshold"));
        assert!(map.contains_key("max_allowed_degrees"));
        assert!(map.contains_key("search_debounce_ms"));

        let (degrees, source) = &map["max_allowed_degrees"];
        assert_eq!(degrees, "70°");
        assert_eq!(*source, ConfigSource::Default);
    }
}
