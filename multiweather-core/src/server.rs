//! HTTP front end: `GET /weather/{city}` answers with the aggregated temperature.

use std::time::Instant;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::{
    aggregate::{AggregateError, ProviderSet},
    model::TemperatureReport,
};

/// Shared state for HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub providers: ProviderSet,
}

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Any aggregation failure becomes a 500 carrying the raw error text.
#[derive(Debug)]
pub struct ApiError(AggregateError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        tracing::error!(error = %message, "temperature aggregation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

pub fn router(providers: ProviderSet) -> Router {
    Router::new()
        .route("/weather/", get(weather_without_city))
        .route("/weather/{*city}", get(weather))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { providers })
}

/// Bind `listen` and serve until the process is stopped.
pub async fn serve(listen: &str, providers: ProviderSet) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {listen}"))?;

    tracing::info!(
        addr = %listener.local_addr().context("Failed to read listener address")?,
        providers = providers.len(),
        "serving weather API"
    );

    axum::serve(listener, router(providers)).await.context("HTTP server failed")
}

/// GET /weather/{*city}
async fn weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Response, ApiError> {
    report(&state.providers, city).await
}

/// GET /weather/ - the city is empty and passed through as such
async fn weather_without_city(State(state): State<AppState>) -> Result<Response, ApiError> {
    report(&state.providers, String::new()).await
}

async fn report(providers: &ProviderSet, city: String) -> Result<Response, ApiError> {
    let begin = Instant::now();
    let kelvin = providers.temperature(&city).await.map_err(ApiError)?;
    let report = Json(TemperatureReport::new(city, kelvin, begin.elapsed()));
    Ok(([(header::CONTENT_TYPE, JSON_UTF8)], report).into_response())
}
