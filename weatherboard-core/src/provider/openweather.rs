use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::model::{CurrentConditions, ForecastSample, Location};

use super::{ProviderError, ProviderId, WeatherProvider, fetch, parse, truncate_body};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

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
            base_url: BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at another host, e.g. a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, endpoint: &str, location: &Location) -> Result<String, ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let request = self
            .http
            .get(url)
            .query(&location_query(location))
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")]);

        let (status, body) = fetch(ProviderId::OpenWeather, request).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound { location: location.to_string() });
        }

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: ProviderId::OpenWeather,
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

fn location_query(location: &Location) -> Vec<(&'static str, String)> {
    match location {
        Location::City(name) => vec![("q", name.clone())],
        Location::Coordinates(coords) => vec![
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
        ],
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_max: f64,
    temp_min: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

// Entries stay as raw JSON so one bad entry doesn't sink the whole forecast.
#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<serde_json::Value>,
}

impl OwForecastEntry {
    fn into_sample(self) -> Option<ForecastSample> {
        let weather = self.weather.into_iter().next()?;

        Some(ForecastSample {
            timestamp: self.dt,
            temperature_max: self.main.temp_max,
            temperature_min: self.main.temp_min,
            condition_description: weather.description,
            condition_icon: weather.icon,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn current(&self, location: &Location) -> Result<CurrentConditions, ProviderError> {
        let body = self.get("weather", location).await?;
        let parsed: OwCurrentResponse = parse(ProviderId::OpenWeather, &body)?;

        let observed_at = DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now);

        let (description, icon) = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

        Ok(CurrentConditions {
            location_name: parsed.name,
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            description,
            icon,
            wind_speed_mps: parsed.wind.speed,
            observed_at,
        })
    }

    async fn forecast(&self, location: &Location) -> Result<Vec<ForecastSample>, ProviderError> {
        let body = self.get("forecast", location).await?;
        let parsed: OwForecastResponse = parse(ProviderId::OpenWeather, &body)?;

        let samples = parsed
            .list
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<OwForecastEntry>(raw) {
                Ok(entry) => entry.into_sample(),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed OpenWeather forecast entry");
                    None
                }
            })
            .collect();

        Ok(samples)
    }
}
