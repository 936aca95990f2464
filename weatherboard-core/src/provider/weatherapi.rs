use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    forecast::MAX_HORIZON,
    model::{CurrentConditions, ForecastSample, Location},
};

use super::{ProviderError, ProviderId, WeatherProvider, fetch, parse, truncate_body};

const BASE_URL: &str = "https://api.weatherapi.com/v1";
/// WeatherAPI.com error code for "No matching location found."
const NO_MATCHING_LOCATION: u32 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(
        &self,
        endpoint: &str,
        location: &Location,
        extra: &[(&str, String)],
    ) -> Result<String, ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let request = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("q", location_query(location).as_str())])
            .query(extra);

        let (status, body) = fetch(ProviderId::WeatherApi, request).await?;

        if status.is_success() {
            return Ok(body);
        }

        let not_found = status == StatusCode::NOT_FOUND
            || serde_json::from_str::<WaErrorResponse>(&body)
                .is_ok_and(|e| e.error.code == NO_MATCHING_LOCATION);

        if not_found {
            return Err(ProviderError::NotFound { location: location.to_string() });
        }

        Err(ProviderError::Status {
            provider: ProviderId::WeatherApi,
            status,
            body: truncate_body(&body),
        })
    }
}

fn location_query(location: &Location) -> String {
    match location {
        Location::City(name) => name.clone(),
        Location::Coordinates(coords) => format!("{},{}", coords.latitude, coords.longitude),
    }
}

fn kph_to_mps(kph: f64) -> f64 {
    kph / 3.6
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    code: u32,
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: WaErrorBody,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    pressure_mb: f64,
    wind_kph: f64,
    condition: WaCondition,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time_epoch: i64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    day: WaDay,
    hour: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

impl WaForecastDay {
    /// Hourly samples, each carrying the day's high and low.
    fn into_samples(self) -> impl Iterator<Item = ForecastSample> {
        let WaDay { maxtemp_c, mintemp_c } = self.day;

        self.hour.into_iter().filter_map(move |raw| {
            match serde_json::from_value::<WaForecastHour>(raw) {
                Ok(hour) => Some(ForecastSample {
                    timestamp: hour.time_epoch,
                    temperature_max: maxtemp_c,
                    temperature_min: mintemp_c,
                    condition_description: hour.condition.text,
                    condition_icon: hour.condition.icon,
                }),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed WeatherAPI forecast hour");
                    None
                }
            }
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn current(&self, location: &Location) -> Result<CurrentConditions, ProviderError> {
        let body = self.get("current.json", location, &[]).await?;
        let parsed: WaResponse = parse(ProviderId::WeatherApi, &body)?;

        let ts = parsed.current.last_updated_epoch.or(parsed.location.localtime_epoch);
        let observed_at = ts.and_then(|ts| DateTime::from_timestamp(ts, 0)).unwrap_or_else(Utc::now);

        Ok(CurrentConditions {
            location_name: parsed.location.name,
            temperature_c: parsed.current.temp_c,
            feels_like_c: parsed.current.feelslike_c,
            humidity_pct: parsed.current.humidity,
            pressure_hpa: parsed.current.pressure_mb,
            description: parsed.current.condition.text,
            icon: parsed.current.condition.icon,
            wind_speed_mps: kph_to_mps(parsed.current.wind_kph),
            observed_at,
        })
    }

    async fn forecast(&self, location: &Location) -> Result<Vec<ForecastSample>, ProviderError> {
        let days = [("days", MAX_HORIZON.to_string())];
        let body = self.get("forecast.json", location, &days).await?;
        let parsed: WaForecastResponse = parse(ProviderId::WeatherApi, &body)?;

        let samples = parsed
            .forecast
            .forecastday
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<WaForecastDay>(raw) {
                Ok(day) => Some(day),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed WeatherAPI forecast day");
                    None
                }
            })
            .flat_map(WaForecastDay::into_samples)
            .collect();

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;

    #[test]
    fn coordinates_are_sent_as_lat_comma_lon() {
        let loc = Location::Coordinates(Coordinates { latitude: 51.5, longitude: -0.12 });
        assert_eq!(location_query(&loc), "51.5,-0.12");
    }

    #[test]
    fn wind_is_converted_to_metres_per_second() {
        assert!((kph_to_mps(36.0) - 10.0).abs() < 1e-9);
    }
}
