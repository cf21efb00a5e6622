use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 0 °C expressed in Kelvin.
pub const ZERO_CELSIUS_K: f64 = 273.15;

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + ZERO_CELSIUS_K
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - ZERO_CELSIUS_K
}

pub fn kelvin_to_fahrenheit(kelvin: f64) -> f64 {
    kelvin_to_celsius(kelvin) * 9.0 / 5.0 + 32.0
}

/// Aggregated temperature for one location, as served over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub city: String,
    /// Kelvin.
    pub temp: f64,
    pub celsius: f64,
    pub fahrenheit: f64,
    /// Wall time spent aggregating, e.g. "312.4ms".
    pub took: String,
}

impl TemperatureReport {
    pub fn new(city: String, kelvin: f64, took: Duration) -> Self {
        Self {
            city,
            temp: kelvin,
            celsius: kelvin_to_celsius(kelvin),
            fahrenheit: kelvin_to_fahrenheit(kelvin),
            took: format!("{took:?}"),
        }
    }
}
