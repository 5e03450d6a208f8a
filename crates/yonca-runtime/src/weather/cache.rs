//! In-memory cache of weather readings.
//!
//! Nearby requests share an entry: coordinates are bucketed to 0.01°
//! (roughly one kilometre), so repeated lookups from one farm within the
//! TTL skip the weather API.

use moka::future::Cache;
use std::time::Duration;

use super::WeatherReading;
use crate::config::CacheConfig;

/// Cache key: coordinates in hundredths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    latitude: i64,
    longitude: i64,
}

impl CoordinateKey {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: (latitude * 100.0).round() as i64,
            longitude: (longitude * 100.0).round() as i64,
        }
    }
}

/// Weather reading cache using moka.
pub struct WeatherCache {
    cache: Cache<CoordinateKey, WeatherReading>,
}

impl WeatherCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl)
    }

    pub async fn get(&self, latitude: f64, longitude: f64) -> Option<WeatherReading> {
        self.cache.get(&CoordinateKey::new(latitude, longitude)).await
    }

    pub async fn insert(&self, latitude: f64, longitude: f64, reading: WeatherReading) {
        self.cache
            .insert(CoordinateKey::new(latitude, longitude), reading)
            .await;
    }

    /// Clear the cache.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate number of entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
