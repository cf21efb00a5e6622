use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    aggregate::ProviderSet,
    provider::{ProviderId, provider_from_config},
};

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Configuration for a single provider. Presence in the `providers` table enables it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the upstream API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Open-Meteo only: overrides the geocoding endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geocoding_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: DEFAULT_LISTEN.to_string() }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    ///
    /// [providers.openmeteo]
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "multiweather", "multiweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Enable a provider, replacing its API key. Endpoint overrides are kept.
    pub fn enable_provider(&mut self, id: ProviderId, api_key: Option<String>) {
        let entry = self.providers.entry(id.as_str().to_string()).or_default();
        entry.api_key = api_key;
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, id: ProviderId) -> Option<&str> {
        self.provider_config(id).and_then(|cfg| cfg.api_key.as_deref())
    }

    /// Enabled, and holding a key if the provider needs one.
    pub fn is_provider_configured(&self, id: ProviderId) -> bool {
        match self.provider_config(id) {
            Some(_) if id.requires_api_key() => self.provider_api_key(id).is_some(),
            Some(_) => true,
            None => false,
        }
    }

    /// Build the provider set from every enabled provider, in `ProviderId::all()` order.
    pub fn provider_set(&self) -> Result<ProviderSet> {
        for name in self.providers.keys() {
            ProviderId::try_from(name.as_str())
                .with_context(|| format!("Invalid [providers.{name}] section in config"))?;
        }

        let providers = ProviderId::all()
            .iter()
            .filter_map(|id| self.provider_config(*id).map(|cfg| (*id, cfg)))
            .map(|(id, cfg)| provider_from_config(id, cfg))
            .collect::<Result<Vec<_>>>()?;

        Ok(ProviderSet::new(providers))
    }
}
