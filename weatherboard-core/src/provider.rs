use crate::{
    Config,
    model::{CurrentConditions, ForecastSample, Location},
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
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
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Location not found: {location}")]
    NotFound { location: String },

    /// `body` is kept for logs only; it is not part of the message.
    #[error("{provider} request failed with status {status}")]
    Status {
        provider: ProviderId,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to reach {provider}: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse {provider} response: {source}")]
    Parse {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },
}

/// A source of current conditions and forecast samples. Units are metric.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current(&self, location: &Location) -> Result<CurrentConditions, ProviderError>;

    /// Sub-daily samples covering the next few days, oldest first.
    async fn forecast(&self, location: &Location) -> Result<Vec<ForecastSample>, ProviderError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider_cfg = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weatherboard configure {id}` and enter your API key."
        )
    })?;

    let api_key = provider_cfg.api_key.clone();
    let base_url = provider_cfg.base_url.clone();

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let provider = OpenWeatherProvider::new(api_key);
            Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
        ProviderId::WeatherApi => {
            let provider = WeatherApiProvider::new(api_key);
            Box::new(match base_url {
                Some(url) => provider.with_base_url(url),
                None => provider,
            })
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// Send `request` and return the status with the full body text.
pub(crate) async fn fetch(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<(StatusCode, String), ProviderError> {
    let res = request
        .send()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })?;

    tracing::debug!(%provider, %status, bytes = body.len(), "provider responded");
    Ok((status, body))
}

pub(crate) fn parse<T: serde::de::DeserializeOwned>(
    provider: ProviderId,
    body: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|source| ProviderError::Parse { provider, source })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
