//! ipapi.co geolocation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Location, LocationProvider, WeatherError};

pub struct IpApiProvider {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for IpApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpApiProvider")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl IpApiProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::HttpError(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    fn url(&self, ip: Option<&str>) -> String {
        match ip {
            Some(ip) => format!("{}/{}/json/", self.base_url, ip),
            None => format!("{}/json/", self.base_url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    country_name: Option<String>,
    region: Option<String>,
}

impl IpApiResponse {
    fn into_location(self) -> Result<Location, WeatherError> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            return Err(WeatherError::ParseError("response has no coordinates".to_string()));
        };

        Ok(Location {
            latitude,
            longitude,
            city: self.city.unwrap_or_else(|| "Unknown".to_string()),
            country: self.country_name.unwrap_or_else(|| "Unknown".to_string()),
            region: self.region,
        })
    }
}

#[async_trait]
impl LocationProvider for IpApiProvider {
    async fn locate(&self, ip: Option<&str>) -> Result<Location, WeatherError> {
        let response = self
            .client
            .get(self.url(ip))
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
        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::ParseError(e.to_string()))?;

        if !status.is_success() || body.error {
            return Err(WeatherError::ApiError {
                status: status.as_u16(),
                message: body.reason.unwrap_or_else(|| "geolocation failed".to_string()),
            });
        }

        body.into_location()
    }

    fn name(&self) -> &str {
        "ipapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let provider = IpApiProvider::new("https://ipapi.co/", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.url(None), "https://ipapi.co/json/");
        assert_eq!(provider.url(Some("8.8.8.8")), "https://ipapi.co/8.8.8.8/json/");
    }

    #[test]
    fn test_response_defaults() {
        let body: IpApiResponse = serde_json::from_str(
            r#"{ "latitude": 40.68, "longitude": 46.36, "region": "Ganja" }"#,
        )
        .unwrap();
        let location = body.into_location().unwrap();
        assert_eq!(location.city, "Unknown");
        assert_eq!(location.country, "Unknown");
        assert_eq!(location.region.as_deref(), Some("Ganja"));
    }

    #[test]
    fn test_response_without_coordinates() {
        let body: IpApiResponse =
            serde_json::from_str(r#"{ "error": true, "reason": "Reserved IP Address" }"#).unwrap();
        assert!(body.error);
        assert!(matches!(body.into_location(), Err(WeatherError::ParseError(_))));
    }
}
