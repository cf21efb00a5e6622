use crate::{
    config::ProviderConfig,
    provider::{
        openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider,
        weatherapi::WeatherApiProvider,
    },
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openmeteo;
pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenMeteo => "openmeteo",
        }
    }

    /// Fixed order in which configured providers form a provider set.
    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi, ProviderId::OpenMeteo]
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderId::OpenMeteo)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi, openmeteo."
            )),
        }
    }
}

/// A single source of temperature readings.
#[async_trait]
pub trait TemperatureProvider: Send + Sync + Debug {
    /// Current temperature at `location`, in Kelvin.
    async fn temperature(&self, location: &str) -> anyhow::Result<f64>;
}

/// Construct a provider from its config entry.
pub fn provider_from_config(
    id: ProviderId,
    config: &ProviderConfig,
) -> anyhow::Result<Arc<dyn TemperatureProvider>> {
    let api_key = || {
        config.api_key.clone().ok_or_else(|| {
            anyhow!(
                "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` and enter your API key."
            )
        })
    };

    let provider: Arc<dyn TemperatureProvider> = match id {
        ProviderId::OpenWeather => {
            let mut p = OpenWeatherProvider::new(api_key()?);
            if let Some(url) = &config.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderId::WeatherApi => {
            let mut p = WeatherApiProvider::new(api_key()?);
            if let Some(url) = &config.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderId::OpenMeteo => {
            let mut p = OpenMeteoProvider::new();
            if let Some(url) = &config.base_url {
                p = p.with_base_url(url);
            }
            if let Some(url) = &config.geocoding_url {
                p = p.with_geocoding_url(url);
            }
            Arc::new(p)
        }
    };

    Ok(provider)
}

/// Send `request`, check the status and decode the JSON body.
///
/// `what` names the upstream call in error messages, e.g. "OpenWeather current weather".
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    what: &str,
) -> anyhow::Result<T> {
    let res = request
        .send()
        .await
        .with_context(|| format!("Failed to send request to {what}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {status}: {}",
            truncate_body(&body)
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::TemperatureProvider;
    use async_trait::async_trait;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
        time::Duration,
    };

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub(crate) async fn fake_upstream(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, router).await });
        format!("http://{addr}")
    }

    /// Provider with a canned outcome, an optional delay and call bookkeeping.
    #[derive(Debug, Clone)]
    pub(crate) struct StubProvider {
        outcome: Result<f64, String>,
        delay: Duration,
        pub(crate) calls: Arc<AtomicUsize>,
        pub(crate) finished: Arc<AtomicBool>,
    }

    impl StubProvider {
        pub(crate) fn reading(kelvin: f64) -> Self {
            Self {
                outcome: Ok(kelvin),
                delay: Duration::ZERO,
                calls: Arc::default(),
                finished: Arc::default(),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self { outcome: Err(message.to_string()), ..Self::reading(0.0) }
        }

        pub(crate) fn after(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn shared(self) -> Arc<dyn TemperatureProvider> {
            Arc::new(self)
        }
    }

    #[async_trait]
    impl TemperatureProvider for StubProvider {
        async fn temperature(&self, _location: &str) -> anyhow::Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.finished.store(true, Ordering::SeqCst);
            self.outcome.clone().map_err(|msg| anyhow::anyhow!(msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_parse_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("OpenWeather").unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn only_openmeteo_is_keyless() {
        assert!(ProviderId::OpenWeather.requires_api_key());
        assert!(ProviderId::WeatherApi.requires_api_key());
        assert!(!ProviderId::OpenMeteo.requires_api_key());
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = ProviderConfig::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
        assert!(err.to_string().contains("weather configure openweather"));
    }

    #[test]
    fn provider_from_config_builds_keyless_provider() {
        let cfg = ProviderConfig::default();
        assert!(provider_from_config(ProviderId::OpenMeteo, &cfg).is_ok());
    }

    #[test]
    fn provider_from_config_works_with_key() {
        let cfg = ProviderConfig { api_key: Some("KEY".into()), ..Default::default() };
        assert!(provider_from_config(ProviderId::WeatherApi, &cfg).is_ok());
    }

    #[test]
    fn truncate_body_limits_length_on_char_boundary() {
        let short = "short body";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }

    #[test]
    fn join_url_trims_trailing_slash() {
        assert_eq!(join_url("http://host/", "/v1/x"), "http://host/v1/x");
        assert_eq!(join_url("http://host", "/v1/x"), "http://host/v1/x");
    }
}
