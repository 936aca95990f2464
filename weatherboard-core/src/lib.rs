//! Core library for the `weatherboard` terminal dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers and geolocation
//! - The forecast reducer and the saved-locations store
//! - The dashboard orchestrator the presentation layer plugs into
//!
//! It is used by `weatherboard-cli`, but can also be reused by other front ends.

pub mod config;
pub mod dashboard;
pub mod favorites;
pub mod forecast;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod storage;

pub use config::{Config, DashboardConfig, ProviderConfig};
pub use dashboard::{Dashboard, DashboardError, DashboardSettings, Notice, Presenter};
pub use geolocation::{GeolocationError, Geolocator, IpGeolocator};
pub use model::{
    Coordinates, CurrentConditions, DailyForecast, ForecastSample, Location, WeatherReport,
};
pub use provider::{ProviderError, ProviderId, WeatherProvider};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
