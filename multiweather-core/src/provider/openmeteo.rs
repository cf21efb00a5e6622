//! Open-Meteo provider.
//!
//! Keyless, but needs two round trips: the city name is first resolved to
//! coordinates through the geocoding API, then the forecast API is asked for the
//! current 2 m air temperature at that point.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::celsius_to_kelvin;

use super::{TemperatureProvider, get_json, join_url};

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    geocoding_url: String,
    http: Client,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_geocoding_url(mut self, geocoding_url: impl Into<String>) -> Self {
        self.geocoding_url = geocoding_url.into();
        self
    }

    async fn locate(&self, location: &str) -> Result<GeoResult> {
        let url = join_url(&self.geocoding_url, "/v1/search");

        let request = self.http.get(url).query(&[("name", location), ("count", "1")]);

        let parsed: GeoResponse = get_json(request, "Open-Meteo geocoding").await?;

        parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Open-Meteo geocoding found no location named '{location}'"))
    }

    async fn current_celsius(&self, place: &GeoResult) -> Result<f64> {
        let url = join_url(&self.base_url, "/v1/forecast");

        let request = self.http.get(url).query(&[
            ("latitude", place.latitude.to_string()),
            ("longitude", place.longitude.to_string()),
            ("current", "temperature_2m".to_string()),
        ]);

        let parsed: ForecastResponse = get_json(request, "Open-Meteo forecast").await?;
        Ok(parsed.current.temperature_2m)
    }
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    // absent when nothing matched
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Debug, Deserialize)]
struct ForecastCurrent {
    temperature_2m: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: ForecastCurrent,
}

#[async_trait]
impl TemperatureProvider for OpenMeteoProvider {
    async fn temperature(&self, location: &str) -> Result<f64> {
        let place = self.locate(location).await?;
        tracing::debug!(
            provider = "openmeteo",
            %location,
            latitude = place.latitude,
            longitude = place.longitude,
            "resolved location"
        );

        let kelvin = celsius_to_kelvin(self.current_celsius(&place).await?);

        tracing::info!(provider = "openmeteo", %location, kelvin, "temperature reading");
        Ok(kelvin)
    }
}
