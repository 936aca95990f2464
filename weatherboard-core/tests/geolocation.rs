//! IP geolocation against a mock HTTP server.

use std::time::Duration;

use weatherboard_core::{Coordinates, GeolocationError, Geolocator, IpGeolocator};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn locate_with(response: ResponseTemplate) -> Result<Coordinates, GeolocationError> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(response)
        .mount(&server)
        .await;

    let geolocator =
        IpGeolocator::with_endpoint(format!("{}/json", server.uri()), Duration::from_millis(500))
            .unwrap();

    geolocator.locate().await
}

#[tokio::test]
async fn success_yields_coordinates() {
    let coords = locate_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": "success",
        "city": "Lisbon",
        "lat": 38.7223,
        "lon": -9.1393
    })))
    .await
    .unwrap();

    assert_eq!(coords, Coordinates { latitude: 38.7223, longitude: -9.1393 });
}

#[tokio::test]
async fn failed_lookup_is_position_unavailable() {
    let err = locate_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": "fail",
        "message": "private range"
    })))
    .await
    .unwrap_err();

    assert_eq!(err, GeolocationError::PositionUnavailable);
}

#[tokio::test]
async fn forbidden_is_permission_denied() {
    let err = locate_with(ResponseTemplate::new(403)).await.unwrap_err();
    assert_eq!(err, GeolocationError::PermissionDenied);
}

#[tokio::test]
async fn server_error_is_unknown() {
    let err = locate_with(ResponseTemplate::new(503)).await.unwrap_err();
    assert_eq!(err, GeolocationError::Unknown);
}

#[tokio::test]
async fn slow_response_is_timeout() {
    let err = locate_with(
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "status": "success", "lat": 1.0, "lon": 2.0 }))
            .set_delay(Duration::from_secs(3)),
    )
    .await
    .unwrap_err();

    assert_eq!(err, GeolocationError::Timeout);
}
