//! # yonca-runtime
//!
//! Async weather acquisition for Yonca.
//!
//! The engine in `yonca-core` is pure and synchronous; it takes weather as
//! input. This crate fills that input from the outside world:
//!
//! - IP geolocation (ipapi.co) with a fixed fallback location
//! - Current conditions (Open-Meteo), normalised for the rule engine
//! - Region mapping from city/admin-region names
//! - Retry with exponential backoff and a TTL cache keyed by rounded
//!   coordinates
//!
//! ## Example
//!
//! ```rust,ignore
//! use yonca_runtime::{RuntimeConfig, WeatherService};
//! use yonca_core::FarmType;
//!
//! let service = WeatherService::from_config(RuntimeConfig::default())?;
//! let local = service.auto_fetch(None).await?;
//! let request = local.request(FarmType::Wheat, chrono::Local::now().date_naive());
//! let response = catalog.engine().evaluate(&request);
//! ```

pub mod config;
pub mod weather;

pub use config::{CacheConfig, RetryConfig, RuntimeConfig};
pub use weather::{
    map_location_to_region, LocalWeather, Location, LocationProvider, WeatherCache, WeatherError,
    WeatherProvider, WeatherReading, WeatherService,
};

#[cfg(feature = "http")]
pub use weather::{IpApiProvider, OpenMeteoProvider};

use thiserror::Error;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid runtime configuration: {0}")]
    Config(String),

    #[error("Weather unavailable: {0}")]
    Weather(#[from] WeatherError),
}
