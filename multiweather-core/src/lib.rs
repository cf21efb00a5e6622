//! Core library for the `weather` CLI and server.
//!
//! This crate defines:
//! - The provider abstraction and the concrete weather APIs behind it
//! - Concurrent aggregation of one temperature across all configured providers
//! - Configuration & credentials handling
//! - The HTTP front end serving aggregated readings
//!
//! It is used by `multiweather-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod model;
pub mod provider;
pub mod server;

pub use aggregate::{AggregateError, ProviderSet};
pub use config::{Config, ProviderConfig, ServerConfig};
pub use model::TemperatureReport;
pub use provider::{ProviderId, TemperatureProvider};
