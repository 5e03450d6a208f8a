//! Runtime configuration.
//!
//! Loaded from YAML or JSON. Durations are human-readable (`"10s"`, `"15m"`).
//!
//! ```yaml
//! request_timeout: 10s
//! retry:
//!   max_times: 2
//!   min_delay: 200ms
//! cache:
//!   max_entries: 1000
//!   ttl: 15m
//! fallback_location:
//!   latitude: 40.4093
//!   longitude: 49.8671
//!   city: Bakı
//!   country: Azerbaijan
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::weather::Location;
use crate::RuntimeError;

pub const DEFAULT_GEOLOCATION_URL: &str = "https://ipapi.co";
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Base URL of the IP geolocation service
    pub geolocation_url: String,

    /// Forecast endpoint of the weather service
    pub weather_url: String,

    /// Per-request HTTP timeout
    #[serde(with = "duration_str")]
    pub request_timeout: Duration,

    pub retry: RetryConfig,

    pub cache: CacheConfig,

    /// Used when geolocation fails
    pub fallback_location: Location,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            geolocation_url: DEFAULT_GEOLOCATION_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            fallback_location: Location::baku(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, RuntimeError> {
        serde_yaml::from_str(yaml).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        serde_json::from_str(json).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    /// Load from a file, picking the format by extension (YAML unless `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }
}

/// Exponential backoff for transient upstream failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_times: usize,

    #[serde(with = "duration_str")]
    pub min_delay: Duration,

    #[serde(with = "duration_str")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_times: 2,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Weather reading cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,

    #[serde(with = "duration_str")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(15 * 60),
        }
    }
}

pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.cache.ttl, Duration::from_secs(900));
        assert_eq!(config.fallback_location.city, "Bakı");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RuntimeConfig::from_yaml(
            r#"
request_timeout: 3s
cache:
  ttl: 1h 30m
retry:
  max_times: 5
"#,
        )
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.cache.ttl, Duration::from_secs(5400));
        assert_eq!(config.cache.max_entries, 1_000);
        assert_eq!(config.retry.max_times, 5);
        assert_eq!(config.retry.min_delay, Duration::from_millis(200));
        assert_eq!(config.weather_url, DEFAULT_WEATHER_URL);
    }

    #[test]
    fn test_bad_duration_rejected() {
        let result = RuntimeConfig::from_json(r#"{ "request_timeout": "soon" }"#);
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = RuntimeConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("request_timeout: 10s"));
        assert_eq!(RuntimeConfig::from_yaml(&yaml).unwrap(), config);
    }
}
