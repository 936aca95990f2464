//! Search orchestration: ties a provider, a store, an optional geolocator and
//! a presenter together. All collaborators are injected; nothing is global.
//!
//! Every failure ends up as a [`Notice`] on the presenter and is also returned
//! to the caller. Results of a search that has been overtaken by a newer one
//! are dropped silently ([`DashboardError::Superseded`]).

use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use crate::{
    config::DashboardConfig,
    favorites, forecast,
    geolocation::{GeolocationError, Geolocator},
    model::{Coordinates, Location, WeatherReport},
    provider::{ProviderError, WeatherProvider},
    storage::{KeyValueStore, StorageError},
};

/// How long a notice stays visible.
pub const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), duration: NOTICE_DURATION }
    }
}

/// The presentation layer. Implementations only render what they are given.
pub trait Presenter: Send + Sync {
    fn show_loading(&self);
    fn hide_loading(&self);
    fn show_report(&self, report: &WeatherReport);
    fn show_favorites(&self, names: &[String]);
    fn show_notice(&self, notice: &Notice);
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Please enter a city name")]
    EmptyQuery,

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error(transparent)]
    Provider(ProviderError),

    #[error("Failed to fetch weather data for your location")]
    LocalWeather(#[source] ProviderError),

    #[error("Geolocation is not supported on this system")]
    GeolocationUnsupported,

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error("Failed to save locations: {0}")]
    Storage(#[from] StorageError),

    #[error("Search was replaced by a newer one")]
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub horizon: usize,
    pub favorites_cap: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self { horizon: forecast::DEFAULT_HORIZON, favorites_cap: favorites::DEFAULT_CAPACITY }
    }
}

impl From<&DashboardConfig> for DashboardSettings {
    fn from(cfg: &DashboardConfig) -> Self {
        Self { horizon: cfg.forecast_days, favorites_cap: cfg.favorites_cap }
    }
}

pub struct Dashboard<S, R> {
    provider: Box<dyn WeatherProvider>,
    store: S,
    geolocator: Option<Box<dyn Geolocator>>,
    presenter: R,
    settings: DashboardSettings,
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

/// Keeps the loading indicator up while at least one guard is alive.
struct Loading<'a, R: Presenter> {
    presenter: &'a R,
    in_flight: &'a AtomicUsize,
}

impl<'a, R: Presenter> Loading<'a, R> {
    fn start(presenter: &'a R, in_flight: &'a AtomicUsize) -> Self {
        if in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            presenter.show_loading();
        }
        Self { presenter, in_flight }
    }
}

impl<R: Presenter> Drop for Loading<'_, R> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.presenter.hide_loading();
        }
    }
}

impl<S: KeyValueStore, R: Presenter> Dashboard<S, R> {
    pub fn new(provider: Box<dyn WeatherProvider>, store: S, presenter: R) -> Self {
        Self {
            provider,
            store,
            geolocator: None,
            presenter,
            settings: DashboardSettings::default(),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_geolocator(mut self, geolocator: Box<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    pub fn with_settings(mut self, settings: DashboardSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn presenter(&self) -> &R {
        &self.presenter
    }

    /// Look up a city typed by the user. On success the query is saved as a
    /// favorite and as the last search.
    pub async fn search(&self, query: &str) -> Result<WeatherReport, DashboardError> {
        let result = self.search_city(query).await;
        self.settle(result)
    }

    pub async fn search_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherReport, DashboardError> {
        let result = self.search_at(coords).await;
        self.settle(result)
    }

    /// Locate the user, then search by coordinates.
    pub async fn search_here(&self) -> Result<WeatherReport, DashboardError> {
        let result = self.locate_and_load().await;
        self.settle(result)
    }

    /// Repeat the persisted last search, if there is one.
    pub async fn restore_last_search(&self) -> Result<Option<WeatherReport>, DashboardError> {
        match favorites::last_search(&self.store) {
            Some(city) => self.search(&city).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn favorites(&self) -> Vec<String> {
        favorites::list(&self.store)
    }

    pub fn show_favorites(&self) -> Vec<String> {
        let names = self.favorites();
        self.presenter.show_favorites(&names);
        names
    }

    pub fn remove_favorite(&self, name: &str) -> Result<Vec<String>, DashboardError> {
        let result = favorites::remove(&self.store, name).map_err(DashboardError::from);
        let names = self.settle(result)?;
        self.presenter.show_favorites(&names);
        Ok(names)
    }

    async fn search_city(&self, query: &str) -> Result<WeatherReport, DashboardError> {
        let city = query.trim();
        if city.is_empty() {
            return Err(DashboardError::EmptyQuery);
        }

        let ticket = self.next_generation();
        let _loading = self.loading();

        let fetched = self.fetch_report(Location::City(city.to_string())).await;
        self.ensure_current(ticket)?;

        let report = fetched.map_err(|err| match err {
            ProviderError::NotFound { .. } | ProviderError::Status { .. } => {
                tracing::debug!(city, error = ?err, "provider rejected city lookup");
                DashboardError::CityNotFound(city.to_string())
            }
            other => DashboardError::Provider(other),
        })?;

        self.presenter.show_report(&report);

        let names = favorites::add(&self.store, city, self.settings.favorites_cap)?;
        favorites::set_last_search(&self.store, city)?;
        self.presenter.show_favorites(&names);

        tracing::info!(city, days = report.forecast.len(), "search completed");
        Ok(report)
    }

    async fn search_at(&self, coords: Coordinates) -> Result<WeatherReport, DashboardError> {
        let ticket = self.next_generation();
        let _loading = self.loading();

        self.load_coordinates(ticket, coords).await
    }

    async fn locate_and_load(&self) -> Result<WeatherReport, DashboardError> {
        let geolocator = self.geolocator.as_ref().ok_or(DashboardError::GeolocationUnsupported)?;

        let ticket = self.next_generation();
        let _loading = self.loading();

        let located = geolocator.locate().await;
        self.ensure_current(ticket)?;

        self.load_coordinates(ticket, located?).await
    }

    async fn load_coordinates(
        &self,
        ticket: u64,
        coords: Coordinates,
    ) -> Result<WeatherReport, DashboardError> {
        let fetched = self.fetch_report(Location::Coordinates(coords)).await;
        self.ensure_current(ticket)?;

        let report = fetched.map_err(DashboardError::LocalWeather)?;
        self.presenter.show_report(&report);

        let name = report.current.location_name.trim();
        if !name.is_empty() {
            let names = favorites::add(&self.store, name, self.settings.favorites_cap)?;
            self.presenter.show_favorites(&names);
        }

        tracing::info!(%coords, location = name, "search completed");
        Ok(report)
    }

    async fn fetch_report(&self, location: Location) -> Result<WeatherReport, ProviderError> {
        tracing::debug!(provider = %self.provider.id(), %location, "fetching weather");

        let (current, samples) =
            tokio::try_join!(self.provider.current(&location), self.provider.forecast(&location))?;

        let forecast = forecast::reduce(samples, self.settings.horizon);

        Ok(WeatherReport { location, current, forecast })
    }

    fn settle<T>(&self, result: Result<T, DashboardError>) -> Result<T, DashboardError> {
        match &result {
            Err(DashboardError::Superseded) => {
                tracing::debug!("dropping result of a superseded search");
            }
            Err(err) => {
                tracing::debug!(error = %err, "dashboard operation failed");
                self.presenter.show_notice(&Notice::new(err.to_string()));
            }
            Ok(_) => {}
        }
        result
    }

    fn loading(&self) -> Loading<'_, R> {
        Loading::start(&self.presenter, &self.in_flight)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_current(&self, ticket: u64) -> Result<(), DashboardError> {
        if self.generation.load(Ordering::SeqCst) == ticket {
            Ok(())
        } else {
            Err(DashboardError::Superseded)
        }
    }
}
