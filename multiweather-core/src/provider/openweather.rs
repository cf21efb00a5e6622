use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{TemperatureProvider, get_json, join_url};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather current-weather endpoint. Without a `units` parameter the API answers
/// in Kelvin, so no conversion is needed.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

#[async_trait]
impl TemperatureProvider for OpenWeatherProvider {
    async fn temperature(&self, location: &str) -> Result<f64> {
        let url = join_url(&self.base_url, "/data/2.5/weather");

        let request = self
            .http
            .get(url)
            .query(&[("q", location), ("appid", self.api_key.as_str())]);

        let parsed: OwCurrentResponse = get_json(request, "OpenWeather current weather").await?;
        let kelvin = parsed.main.temp;

        tracing::info!(provider = "openweather", %location, kelvin, "temperature reading");
        Ok(kelvin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::fake_upstream;
    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn upstream() -> Router {
        Router::new().route(
            "/data/2.5/weather",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("appid").map(String::as_str) != Some("KEY") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid API key"})));
                }
                match q.get("q").map(String::as_str) {
                    Some("Berlin") => (
                        StatusCode::OK,
                        Json(json!({"name": "Berlin", "main": {"temp": 285.5, "humidity": 80}})),
                    ),
                    Some("Nowhere") => (StatusCode::OK, Json(json!({"cod": 200}))),
                    _ => (StatusCode::NOT_FOUND, Json::<Value>(json!({"message": "city not found"}))),
                }
            }),
        )
    }

    #[tokio::test]
    async fn returns_kelvin_from_main_temp() {
        let base = fake_upstream(upstream()).await;
        let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(base);

        let kelvin = provider.temperature("Berlin").await.expect("reading");
        assert_eq!(kelvin, 285.5);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_with_body() {
        let base = fake_upstream(upstream()).await;
        let provider = OpenWeatherProvider::new("WRONG".into()).with_base_url(base);

        let err = provider.temperature("Berlin").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("Invalid API key"), "{msg}");
    }

    #[tokio::test]
    async fn missing_temperature_is_a_parse_error() {
        let base = fake_upstream(upstream()).await;
        let provider = OpenWeatherProvider::new("KEY".into()).with_base_url(base);

        let err = provider.temperature("Nowhere").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse OpenWeather"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_send_error() {
        let provider =
            OpenWeatherProvider::new("KEY".into()).with_base_url("http://127.0.0.1:1");

        let err = provider.temperature("Berlin").await.unwrap_err();
        assert!(err.to_string().contains("Failed to send request to OpenWeather"));
    }
}
