//! Location and current-weather acquisition.
//!
//! Providers sit behind two traits so the service can be tested without a
//! network: [`LocationProvider`] resolves an IP (or the caller's own address)
//! to coordinates, [`WeatherProvider`] returns current conditions for
//! coordinates.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use yonca_core::{Region, WeatherData};

mod cache;
mod region;
mod service;

#[cfg(feature = "http")]
mod ipapi;
#[cfg(feature = "http")]
mod open_meteo;

pub use cache::{CoordinateKey, WeatherCache};
pub use region::map_location_to_region;
pub use service::{LocalWeather, WeatherService};

#[cfg(feature = "http")]
pub use ipapi::IpApiProvider;
#[cfg(feature = "http")]
pub use open_meteo::OpenMeteoProvider;

/// Errors from location and weather providers.
#[derive(Error, Debug, Clone)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl WeatherError {
    /// Whether retrying the same call can help.
    pub fn is_transient(&self) -> bool {
        match self {
            WeatherError::HttpError(_) | WeatherError::Timeout(_) => true,
            WeatherError::ApiError { status, .. } => *status == 429 || *status >= 500,
            WeatherError::ParseError(_) => false,
        }
    }
}

/// A geolocated place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,

    /// Administrative region as reported by the geolocation service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            city: city.into(),
            country: country.into(),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Bakı, Azerbaijan.
    pub fn baku() -> Self {
        Self::new(40.4093, 49.8671, "Bakı", "Azerbaijan")
    }

    /// The agricultural region this place falls in.
    pub fn farm_region(&self) -> Region {
        map_location_to_region(&self.city, self.region.as_deref())
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::baku()
    }
}

/// Current conditions, normalised for the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// °C, rounded
    pub temperature: f64,

    /// %, rounded
    pub humidity: f64,

    /// mm
    pub rainfall_last_24h: f64,

    /// km/h, rounded
    pub wind_speed: f64,

    pub frost_warning: bool,

    /// Observation time as reported upstream (local, ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<String>,
}

impl WeatherReading {
    /// Normalise raw upstream values.
    ///
    /// The frost flag is taken from the unrounded temperature.
    pub fn from_raw(temperature: f64, humidity: f64, precipitation: f64, wind_speed: f64) -> Self {
        Self {
            temperature: round_whole(temperature),
            humidity: round_whole(humidity),
            rainfall_last_24h: precipitation,
            wind_speed: round_whole(wind_speed),
            frost_warning: temperature < 0.0,
            observed_at: None,
        }
    }

    pub fn with_observed_at(mut self, observed_at: impl Into<String>) -> Self {
        self.observed_at = Some(observed_at.into());
        self
    }

    /// The engine's view of this reading.
    pub fn to_weather_data(&self) -> WeatherData {
        WeatherData {
            rainfall_last_24h: self.rainfall_last_24h,
            wind_speed: self.wind_speed,
            frost_warning: self.frost_warning,
            ..WeatherData::new(self.temperature, self.humidity)
        }
    }
}

/// Round half to even; `-0.0` comes back as `0.0`.
fn round_whole(value: f64) -> f64 {
    let rounded = value.round_ties_even();
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

impl From<WeatherReading> for WeatherData {
    fn from(reading: WeatherReading) -> Self {
        reading.to_weather_data()
    }
}

/// Resolves an IP address to a location.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Locate `ip`, or the caller's public address when `None`.
    async fn locate(&self, ip: Option<&str>) -> Result<Location, WeatherError>;

    fn name(&self) -> &str;
}

/// Returns current conditions for coordinates.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, WeatherError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_normalisation() {
        let reading = WeatherReading::from_raw(-0.4, 81.6, 1.2, 12.5);
        assert_eq!(reading.temperature, 0.0);
        assert!(reading.temperature.is_sign_positive());
        assert_eq!(reading.humidity, 82.0);
        assert_eq!(reading.rainfall_last_24h, 1.2);
        assert_eq!(reading.wind_speed, 12.0);
        assert!(reading.frost_warning);

        let warm = WeatherReading::from_raw(24.6, 40.0, 0.0, 3.0);
        assert_eq!(warm.temperature, 25.0);
        assert!(!warm.frost_warning);
    }

    #[test]
    fn test_halves_round_to_even() {
        let reading = WeatherReading::from_raw(18.5, 62.5, 0.0, 13.5);
        assert_eq!(reading.temperature, 18.0);
        assert_eq!(reading.humidity, 62.0);
        assert_eq!(reading.wind_speed, 14.0);

        let cold = WeatherReading::from_raw(-2.5, 90.0, 0.0, 0.5);
        assert_eq!(cold.temperature, -2.0);
        assert_eq!(cold.wind_speed, 0.0);
        assert!(cold.wind_speed.is_sign_positive());
    }

    #[test]
    fn test_minus_zero_serializes_as_zero() {
        let reading = WeatherReading::from_raw(-0.3, 70.0, 0.0, 2.0);
        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"temperature\":0.0"), "{json}");
        assert!(!json.contains("-0"), "{json}");
    }

    #[test]
    fn test_reading_into_weather_data() {
        let data: WeatherData = WeatherReading::from_raw(31.2, 22.0, 0.0, 18.4).into();
        assert_eq!(data.temperature, 31.0);
        assert_eq!(data.wind_speed, 18.0);
        assert!(!data.rainfall_forecast_48h);
        assert!(data.time_of_day.is_none());
    }

    #[test]
    fn test_transient_errors() {
        assert!(WeatherError::Timeout(Duration::from_secs(10)).is_transient());
        assert!(WeatherError::ApiError { status: 503, message: String::new() }.is_transient());
        assert!(WeatherError::ApiError { status: 429, message: String::new() }.is_transient());
        assert!(!WeatherError::ApiError { status: 400, message: String::new() }.is_transient());
        assert!(!WeatherError::ParseError("bad".into()).is_transient());
    }

    #[test]
    fn test_location_region() {
        assert_eq!(Location::baku().farm_region(), Region::Aran);
        let lankaran = Location::new(38.75, 48.85, "Lənkəran", "Azerbaijan");
        assert_eq!(lankaran.farm_region(), Region::Lankaran);
    }
}
