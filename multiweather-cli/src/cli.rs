use std::{io::Write, path::PathBuf, time::Instant};

use anyhow::bail;
use clap::{Parser, Subcommand};
use multiweather_core::{
    Config, ProviderId,
    model::{kelvin_to_celsius, kelvin_to_fahrenheit},
    server,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Averaged temperature from several weather APIs")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Enable a provider, prompting for its API key if it needs one.
    Configure {
        /// Provider short name, e.g. "openweather", "weatherapi" or "openmeteo".
        provider: String,
    },

    /// Show the averaged temperature for a city.
    Show {
        /// City or location name.
        city: String,
    },

    /// Serve `GET /weather/{city}` over HTTP.
    Serve {
        /// Listen address; defaults to `server.listen` from the config.
        #[arg(long)]
        listen: Option<String>,
    },

    /// List supported providers and whether they are configured.
    Providers,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        self.execute(&mut std::io::stdout()).await
    }

    /// Run the command, writing user-facing output to `out`.
    async fn execute(self, out: &mut impl Write) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&path)?;

        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;

                let api_key = if id.requires_api_key() {
                    let key = inquire::Password::new(&format!("API key for {id}:"))
                        .without_confirmation()
                        .with_display_mode(inquire::PasswordDisplayMode::Masked)
                        .prompt()?;
                    let key = key.trim();
                    if key.is_empty() {
                        bail!("API key for '{id}' must not be empty");
                    }
                    Some(key.to_string())
                } else {
                    None
                };

                config.enable_provider(id, api_key);
                config.save_to(&path)?;
                tracing::debug!(provider = %id, path = %path.display(), "saved configuration");
                writeln!(out, "Provider '{id}' configured in {}", path.display())?;
            }
            Command::Show { city } => {
                let providers = config.provider_set()?;
                let begin = Instant::now();
                let kelvin = providers.temperature(&city).await?;

                writeln!(
                    out,
                    "{city}: {kelvin:.2} K ({:.2} °C, {:.2} °F) from {} providers in {:?}",
                    kelvin_to_celsius(kelvin),
                    kelvin_to_fahrenheit(kelvin),
                    providers.len(),
                    begin.elapsed(),
                )?;
            }
            Command::Serve { listen } => {
                let providers = config.provider_set()?;
                if providers.is_empty() {
                    tracing::warn!(
                        "no providers configured; every request will fail until one is added \
                         with `weather configure <provider>`"
                    );
                }
                let listen = listen.unwrap_or(config.server.listen);
                server::serve(&listen, providers).await?;
            }
            Command::Providers => {
                for id in ProviderId::all() {
                    let state = if config.is_provider_configured(*id) {
                        "configured"
                    } else if config.provider_config(*id).is_some() {
                        "missing API key"
                    } else {
                        "not configured"
                    };
                    writeln!(out, "{:<12} {state}", id.as_str())?;
                }
            }
        }

        Ok(())
    }
}
