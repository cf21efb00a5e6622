use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::model::celsius_to_kelvin;

use super::{TemperatureProvider, get_json, join_url};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

#[async_trait]
impl TemperatureProvider for WeatherApiProvider {
    async fn temperature(&self, location: &str) -> Result<f64> {
        let url = join_url(&self.base_url, "/v1/current.json");

        let request =
            self.http.get(url).query(&[("key", self.api_key.as_str()), ("q", location)]);

        let parsed: WaResponse = get_json(request, "WeatherAPI current weather").await?;
        let kelvin = celsius_to_kelvin(parsed.current.temp_c);

        tracing::info!(provider = "weatherapi", %location, kelvin, "temperature reading");
        Ok(kelvin)
    }
}
