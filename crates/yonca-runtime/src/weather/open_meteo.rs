//! Open-Meteo current conditions.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{WeatherError, WeatherProvider, WeatherReading};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,precipitation,wind_speed_10m";

pub struct OpenMeteoProvider {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for OpenMeteoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenMeteoProvider")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenMeteoProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::HttpError(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            client,
            timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    #[serde(default)]
    time: Option<String>,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    #[serde(default)]
    precipitation: f64,
    #[serde(default)]
    wind_speed_10m: f64,
}

impl From<CurrentConditions> for WeatherReading {
    fn from(current: CurrentConditions) -> Self {
        let reading = WeatherReading::from_raw(
            current.temperature_2m,
            current.relative_humidity_2m,
            current.precipitation,
            current.wind_speed_10m,
        );
        match current.time {
            Some(time) => reading.with_observed_at(time),
            None => reading,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoError {
    reason: String,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherReading, WeatherError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WeatherError::Timeout(self.timeout)
                } else {
                    WeatherError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<OpenMeteoError>()
                .await
                .map(|e| e.reason)
                .unwrap_or_else(|e| e.to_string());

            return Err(WeatherError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::ParseError(e.to_string()))?;

        Ok(body.current.into())
    }

    fn name(&self) -> &str {
        "open-meteo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forecast() {
        let body: ForecastResponse = serde_json::from_str(
            r#"{
                "latitude": 40.4,
                "longitude": 49.875,
                "timezone": "Asia/Baku",
                "current": {
                    "time": "2025-01-14T07:00",
                    "interval": 900,
                    "temperature_2m": -1.6,
                    "relative_humidity_2m": 88,
                    "precipitation": 0.3,
                    "wind_speed_10m": 14.8
                }
            }"#,
        )
        .unwrap();

        let reading = WeatherReading::from(body.current);
        assert_eq!(reading.temperature, -2.0);
        assert_eq!(reading.humidity, 88.0);
        assert_eq!(reading.rainfall_last_24h, 0.3);
        assert_eq!(reading.wind_speed, 15.0);
        assert!(reading.frost_warning);
        assert_eq!(reading.observed_at.as_deref(), Some("2025-01-14T07:00"));
    }

    #[test]
    fn test_missing_current_is_error() {
        assert!(serde_json::from_str::<ForecastResponse>(r#"{ "latitude": 1.0 }"#).is_err());
    }
}
