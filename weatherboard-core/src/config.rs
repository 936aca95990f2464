use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{favorites, forecast, provider::ProviderId};

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's public endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// `[dashboard]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of days in the reduced forecast, between 1 and
    /// [`forecast::MAX_HORIZON`]. Providers are asked for that many days.
    pub forecast_days: usize,
    /// Maximum number of saved locations, between 1 and [`favorites::MAX_CAPACITY`].
    pub favorites_cap: usize,
    /// Whether `here` may look up the current position.
    pub geolocation: bool,
    /// Where saved locations and the last search are kept; defaults to the
    /// platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            forecast_days: forecast::DEFAULT_HORIZON,
            favorites_cap: favorites::DEFAULT_CAPACITY,
            geolocation: true,
            storage_path: None,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `weatherboard configure <provider>` (e.g. `weatherboard configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let dashboard = &self.dashboard;

        if !(1..=forecast::MAX_HORIZON).contains(&dashboard.forecast_days) {
            return Err(anyhow!(
                "dashboard.forecast_days must be between 1 and {}, got {}",
                forecast::MAX_HORIZON,
                dashboard.forecast_days
            ));
        }
        if !(1..=favorites::MAX_CAPACITY).contains(&dashboard.favorites_cap) {
            return Err(anyhow!(
                "dashboard.favorites_cap must be between 1 and {}, got {}",
                favorites::MAX_CAPACITY,
                dashboard.favorites_cap
            ));
        }
        Ok(())
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherboard", "weatherboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    /// A previously configured base URL is kept.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        let base_url = self
            .providers
            .get(provider_id.as_str())
            .and_then(|cfg| cfg.base_url.clone());

        self.providers
            .insert(provider_id.as_str().to_string(), ProviderConfig { api_key, base_url });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }
}
