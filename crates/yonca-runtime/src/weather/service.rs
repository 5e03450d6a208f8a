//! Location-aware weather lookup with fallback, retry and caching.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::NaiveDate;
use serde::Serialize;
use yonca_core::{FarmType, RecommendationRequest, Region, WeatherData};

use super::{Location, LocationProvider, WeatherCache, WeatherError, WeatherProvider, WeatherReading};
use crate::config::RuntimeConfig;
use crate::RuntimeError;

/// Current weather at a resolved location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalWeather {
    #[serde(flatten)]
    pub reading: WeatherReading,

    pub location: Location,

    pub region: Region,

    /// The configured fallback location was used
    pub fallback: bool,
}

impl LocalWeather {
    pub fn weather_data(&self) -> WeatherData {
        self.reading.to_weather_data()
    }

    /// A minimal recommendation request for this place and weather.
    pub fn request(&self, farm_type: FarmType, date: NaiveDate) -> RecommendationRequest {
        RecommendationRequest::new(farm_type, self.region, date, self.weather_data())
    }
}

/// Geolocates callers and fetches their current weather.
pub struct WeatherService {
    locator: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherProvider>,
    cache: WeatherCache,
    config: RuntimeConfig,
}

impl std::fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherService")
            .field("locator", &self.locator.name())
            .field("weather", &self.weather.name())
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

impl WeatherService {
    pub fn new(
        locator: Arc<dyn LocationProvider>,
        weather: Arc<dyn WeatherProvider>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            locator,
            weather,
            cache: WeatherCache::from_config(&config.cache),
            config,
        }
    }

    /// Service backed by ipapi.co and Open-Meteo.
    #[cfg(feature = "http")]
    pub fn from_config(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let locator = super::IpApiProvider::new(&config.geolocation_url, config.request_timeout)?;
        let weather = super::OpenMeteoProvider::new(&config.weather_url, config.request_timeout)?;
        Ok(Self::new(Arc::new(locator), Arc::new(weather), config))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.retry.min_delay)
            .with_max_delay(self.config.retry.max_delay)
            .with_max_times(self.config.retry.max_times)
    }

    /// Resolve `ip` to a location. Never fails: any error yields the
    /// fallback location and `true`.
    pub async fn locate(&self, ip: Option<&str>) -> (Location, bool) {
        let result = (|| async { self.locator.locate(ip).await })
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(WeatherError::is_transient)
            .notify(|err: &WeatherError, dur: Duration| {
                tracing::debug!(error = %err, retry_in = ?dur, "Retrying geolocation");
            })
            .await;

        match result {
            Ok(location) => (location, false),
            Err(e) => {
                tracing::warn!(
                    provider = self.locator.name(),
                    error = %e,
                    fallback = %self.config.fallback_location.city,
                    "Geolocation failed, using fallback location"
                );
                (self.config.fallback_location.clone(), true)
            }
        }
    }

    /// Current weather at the given coordinates, served from cache when fresh.
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, WeatherError> {
        if let Some(reading) = self.cache.get(latitude, longitude).await {
            tracing::debug!(latitude, longitude, "Weather cache hit");
            return Ok(reading);
        }

        let result = (|| async { self.weather.current(latitude, longitude).await })
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(WeatherError::is_transient)
            .notify(|err: &WeatherError, dur: Duration| {
                tracing::debug!(error = %err, retry_in = ?dur, "Retrying weather fetch");
            })
            .await;

        match result {
            Ok(reading) => {
                self.cache.insert(latitude, longitude, reading.clone()).await;
                Ok(reading)
            }
            Err(e) => {
                tracing::warn!(provider = self.weather.name(), error = %e, "Weather fetch failed");
                Err(e)
            }
        }
    }

    /// Locate the caller, fetch their weather and map them to a region.
    ///
    /// Geolocation failures fall back silently; weather failures are errors.
    pub async fn auto_fetch(&self, ip: Option<&str>) -> Result<LocalWeather, RuntimeError> {
        let (location, fallback) = self.locate(ip).await;
        let reading = self.current(location.latitude, location.longitude).await?;
        let region = location.farm_region();

        tracing::info!(
            city = %location.city,
            region = %region,
            fallback,
            temperature = reading.temperature,
            "Weather fetched"
        );

        Ok(LocalWeather {
            reading,
            location,
            region,
            fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockLocator {
        result: Result<Location, WeatherError>,
        calls: AtomicUsize,
    }

    impl MockLocator {
        fn ok(location: Location) -> Arc<Self> {
            Arc::new(Self { result: Ok(location), calls: AtomicUsize::new(0) })
        }

        fn failing(error: WeatherError) -> Arc<Self> {
            Arc::new(Self { result: Err(error), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl LocationProvider for MockLocator {
        async fn locate(&self, _ip: Option<&str>) -> Result<Location, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        fn name(&self) -> &str {
            "mock-locator"
        }
    }

    /// Pops scripted results; repeats the last one when exhausted.
    struct MockWeather {
        script: Mutex<Vec<Result<WeatherReading, WeatherError>>>,
        calls: AtomicUsize,
    }

    impl MockWeather {
        fn scripted(mut script: Vec<Result<WeatherReading, WeatherError>>) -> Arc<Self> {
            script.reverse();
            Arc::new(Self { script: Mutex::new(script), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl WeatherProvider for MockWeather {
        async fn current(&self, _lat: f64, _lon: f64) -> Result<WeatherReading, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop().unwrap()
            } else {
                script[0].clone()
            }
        }

        fn name(&self) -> &str {
            "mock-weather"
        }
    }

    fn fast_config() -> RuntimeConfig {
        RuntimeConfig {
            retry: RetryConfig {
                max_times: 2,
                min_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
            ..Default::default()
        }
    }

    fn ganja() -> Location {
        Location::new(40.68, 46.36, "Ganja", "Azerbaijan")
    }

    fn mild() -> WeatherReading {
        WeatherReading::from_raw(18.4, 61.0, 0.0, 7.2)
    }

    #[tokio::test]
    async fn test_auto_fetch() {
        let locator = MockLocator::ok(ganja());
        let weather = MockWeather::scripted(vec![Ok(mild())]);
        let service = WeatherService::new(locator, weather, fast_config());

        let local = service.auto_fetch(Some("5.197.0.1")).await.unwrap();
        assert_eq!(local.region, Region::GanjaGazakh);
        assert!(!local.fallback);
        assert_eq!(local.reading.temperature, 18.0);
        assert_eq!(local.weather_data().humidity, 61.0);

        let request = local.request(FarmType::Orchard, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(request.region, Region::GanjaGazakh);
        assert_eq!(request.weather.temperature, 18.0);
    }

    #[tokio::test]
    async fn test_geolocation_failure_falls_back() {
        let locator = MockLocator::failing(WeatherError::ApiError {
            status: 403,
            message: "Reserved IP Address".into(),
        });
        let weather = MockWeather::scripted(vec![Ok(mild())]);
        let service = WeatherService::new(locator.clone(), weather, fast_config());

        let local = service.auto_fetch(Some("127.0.0.1")).await.unwrap();
        assert!(local.fallback);
        assert_eq!(local.location.city, "Bakı");
        assert_eq!(local.region, Region::Aran);
        // Client errors are not retried.
        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_weather_errors_are_retried() {
        let weather = MockWeather::scripted(vec![
            Err(WeatherError::Timeout(Duration::from_secs(10))),
            Err(WeatherError::ApiError { status: 502, message: "bad gateway".into() }),
            Ok(mild()),
        ]);
        let service = WeatherService::new(MockLocator::ok(ganja()), weather.clone(), fast_config());

        let reading = service.current(40.68, 46.36).await.unwrap();
        assert_eq!(reading, mild());
        assert_eq!(weather.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let weather = MockWeather::scripted(vec![Err(WeatherError::HttpError("reset".into()))]);
        let service = WeatherService::new(MockLocator::ok(ganja()), weather.clone(), fast_config());

        let result = service.auto_fetch(None).await;
        assert!(matches!(result, Err(RuntimeError::Weather(WeatherError::HttpError(_)))));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_readings_are_cached() {
        let weather = MockWeather::scripted(vec![Ok(mild())]);
        let service = WeatherService::new(MockLocator::ok(ganja()), weather.clone(), fast_config());

        service.current(40.6812, 46.3611).await.unwrap();
        service.current(40.68, 46.36).await.unwrap();
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);

        service.cache().invalidate_all();
        service.current(40.68, 46.36).await.unwrap();
        assert_eq!(weather.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let weather = MockWeather::scripted(vec![
            Err(WeatherError::ParseError("garbage".into())),
            Ok(mild()),
        ]);
        let service = WeatherService::new(MockLocator::ok(ganja()), weather.clone(), fast_config());

        let first = service.current(40.0, 49.0).await;
        assert!(matches!(first, Err(WeatherError::ParseError(_))));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);

        let second = service.current(40.0, 49.0).await.unwrap();
        assert_eq!(second, mild());
        assert_eq!(weather.calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.cache().get(40.0, 49.0).await, Some(mild()));
    }

    #[test]
    fn test_local_weather_serializes_flat() {
        let local = LocalWeather {
            reading: mild(),
            location: Location::baku(),
            region: Region::Aran,
            fallback: true,
        };
        let value = serde_json::to_value(&local).unwrap();
        assert_eq!(value["temperature"], 18.0);
        assert_eq!(value["region"], "aran");
        assert_eq!(value["location"]["city"], "Bakı");
        assert_eq!(value["fallback"], true);
    }
}
