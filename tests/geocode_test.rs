use std::path::PathBuf;
use std::time::Duration;

use franchise_radius_server::geocode::{GeocodeError, GeocodingClient};
use franchise_radius_server::Config;
use httpmock::prelude::*;

fn config_for(server: &MockServer) -> Config {
    Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "debug".to_string(),
        data_file: PathBuf::from("unused.csv"),
        geocoder_url: server.base_url(),
        geocoder_user_agent: "franchise-radius-test".to_string(),
        geocoder_rate_per_sec: 50,
        geocoder_timeout: Duration::from_secs(5),
        client_origin: "http://localhost:3000".to_string(),
    }
}

#[tokio::test]
async fn test_geocode_first_hit() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("q", "Ampang")
                .query_param("format", "json")
                .query_param("limit", "1")
                .header("user-agent", "franchise-radius-test");
            then.status(200).json_body(serde_json::json!([
                {"lat": "3.1590", "lon": "101.7130", "display_name": "Ampang, Selangor, Malaysia"},
                {"lat": "0", "lon": "0", "display_name": "ignored"}
            ]));
        })
        .await;

    let client = GeocodingClient::new(&config_for(&server)).unwrap();
    let result = client.geocode("  Ampang ").await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.latitude, 3.1590);
    assert_eq!(result.longitude, 101.7130);
    assert_eq!(result.display_name, "Ampang, Selangor, Malaysia");
}

#[tokio::test]
async fn test_geocode_no_hits_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    let client = GeocodingClient::new(&config_for(&server)).unwrap();
    let err = client.geocode("Nowhere").await.unwrap_err();

    assert!(matches!(err, GeocodeError::NotFound(ref a) if a == "Nowhere"));
}

#[tokio::test]
async fn test_geocode_upstream_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(503).body("overloaded");
        })
        .await;

    let client = GeocodingClient::new(&config_for(&server)).unwrap();
    let err = client.geocode("Ampang").await.unwrap_err();

    assert!(matches!(err, GeocodeError::Api { status: 503, ref body } if body == "overloaded"));
}

async fn geocode_with_hit(lat: &str, lon: &str) -> GeocodeError {
    let server = MockServer::start_async().await;
    let hit = serde_json::json!([{"lat": lat, "lon": lon, "display_name": "x"}]);
    server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(hit);
        })
        .await;

    let client = GeocodingClient::new(&config_for(&server)).unwrap();
    client.geocode("Ampang").await.unwrap_err()
}

#[tokio::test]
async fn test_geocode_bad_coordinate() {
    let err = geocode_with_hit("north", "101.7").await;
    assert!(matches!(err, GeocodeError::BadCoordinate(_)));
}

#[tokio::test]
async fn test_geocode_unusable_coordinate() {
    for (lat, lon) in [("NaN", "101.7"), ("3.1", "250"), ("inf", "101.7"), ("-91", "0")] {
        let err = geocode_with_hit(lat, lon).await;
        assert!(
            matches!(err, GeocodeError::BadCoordinate(ref raw) if raw.contains(lat) && raw.contains(lon)),
            "{lat}, {lon} accepted"
        );
    }
}

#[tokio::test]
async fn test_geocode_empty_address_skips_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    let client = GeocodingClient::new(&config_for(&server)).unwrap();
    let err = client.geocode("   ").await.unwrap_err();

    assert!(matches!(err, GeocodeError::EmptyAddress));
    assert_eq!(mock.hits_async().await, 0);
}
