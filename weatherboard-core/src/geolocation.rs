//! Where is "here"? The dashboard only needs a coordinate pair or one of four
//! failure kinds; how the position is obtained is up to the [`Geolocator`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::model::Coordinates;

const IP_API_URL: &str = "http://ip-api.com/json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("weatherboard/", env!("CARGO_PKG_VERSION"));

/// Why a position couldn't be determined. The messages are shown to users as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location access denied by user")]
    PermissionDenied,
    #[error("Location information is unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("An unknown error occurred while retrieving location")]
    Unknown,
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Approximate position from the public IP address, via an ip-api.com
/// compatible endpoint.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    endpoint: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpGeolocator {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_endpoint(IP_API_URL, REQUEST_TIMEOUT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;

        Ok(Self { endpoint: endpoint.into(), http })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let res = self.http.get(&self.endpoint).send().await.map_err(transport_error)?;

        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GeolocationError::PermissionDenied);
            }
            StatusCode::NOT_FOUND => return Err(GeolocationError::PositionUnavailable),
            status if !status.is_success() => {
                tracing::debug!(%status, "geolocation endpoint returned an error status");
                return Err(GeolocationError::Unknown);
            }
            _ => {}
        }

        let body: IpApiResponse = res.json().await.map_err(transport_error)?;

        if body.status != "success" {
            tracing::debug!(message = ?body.message, "geolocation lookup failed");
            return Err(GeolocationError::PositionUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(GeolocationError::PositionUnavailable),
        }
    }
}

fn transport_error(err: reqwest::Error) -> GeolocationError {
    if err.is_timeout() {
        GeolocationError::Timeout
    } else {
        tracing::debug!(error = %err, "geolocation request failed");
        GeolocationError::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_match_user_facing_text() {
        assert_eq!(GeolocationError::PermissionDenied.to_string(), "Location access denied by user");
        assert_eq!(
            GeolocationError::PositionUnavailable.to_string(),
            "Location information is unavailable"
        );
        assert_eq!(GeolocationError::Timeout.to_string(), "Location request timed out");
        assert_eq!(
            GeolocationError::Unknown.to_string(),
            "An unknown error occurred while retrieving location"
        );
    }
}
