use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What a provider is asked about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Location {
    City(String),
    Coordinates(Coordinates),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City(name) => f.write_str(name),
            Location::Coordinates(coords) => coords.fmt(f),
        }
    }
}

/// Current conditions, always in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub description: String,
    pub icon: String,
    pub wind_speed_mps: f64,
    pub observed_at: DateTime<Utc>,
}

/// One raw forecast data point as reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Unix seconds.
    pub timestamp: i64,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub condition_description: String,
    pub condition_icon: String,
}

/// One entry per calendar day, produced by [`crate::forecast::reduce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub condition_description: String,
    pub condition_icon: String,
}

/// Everything a successful search hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: Location,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display() {
        assert_eq!(Location::City("Paris".into()).to_string(), "Paris");

        let coords = Coordinates { latitude: 48.85661, longitude: 2.35222 };
        assert_eq!(Location::Coordinates(coords).to_string(), "48.8566, 2.3522");
    }
}
