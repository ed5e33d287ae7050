//! HTTP client tests against a local mock server

use std::time::Duration;

use carefinder::config::{DeviceAddressConfig, GeocodingConfig};
use carefinder::device_address::DeviceAddressRequest;
use carefinder::{
    CareFinderError, DeviceAddressClient, DeviceAddressLookup, ErWaitFeedClient, FacilityFeed,
    GeocodingProvider, GoogleGeocodingClient,
};
use mockito::Matcher;

const FEED_BODY: &str = r#"{
    "rss": {
        "channel": {
            "item": [
                {
                    "title": "Tampa General",
                    "displayName": "Tampa General Hospital",
                    "latitude": "27.9378",
                    "longitude": "-82.4412",
                    "description": "11 minutes"
                },
                {
                    "title": "Orlando Regional",
                    "latitude": 28.5383,
                    "longitude": -81.3792,
                    "description": "25 minutes"
                }
            ]
        }
    }
}"#;

#[tokio::test]
async fn test_feed_client_fetches_and_parses() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rss/er/feed.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(FEED_BODY)
        .create_async()
        .await;

    let client = ErWaitFeedClient::with_timeout("http", Duration::from_secs(5)).unwrap();
    let records = client
        .fetch(&server.host_with_port(), "/rss/er/feed.json")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].spoken_name(), "Tampa General Hospital");
    assert_eq!(records[1].latitude, "28.5383");
}

#[tokio::test]
async fn test_feed_client_maps_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rss/er/feed.json")
        .with_status(503)
        .create_async()
        .await;

    let client = ErWaitFeedClient::with_timeout("http", Duration::from_secs(5)).unwrap();
    let result = client
        .fetch(&server.host_with_port(), "/rss/er/feed.json")
        .await;

    assert!(matches!(result, Err(CareFinderError::FeedUnavailable { .. })));
}

#[tokio::test]
async fn test_feed_client_rejects_unexpected_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rss/er/feed.json")
        .with_status(200)
        .with_body("<rss><channel/></rss>")
        .create_async()
        .await;

    let client = ErWaitFeedClient::with_timeout("http", Duration::from_secs(5)).unwrap();
    let result = client
        .fetch(&server.host_with_port(), "/rss/er/feed.json")
        .await;

    assert!(matches!(result, Err(CareFinderError::FeedParse { .. })));
}

fn geocoding_config(server: &mockito::Server) -> GeocodingConfig {
    GeocodingConfig {
        api_key: Some("test-key".to_string()),
        base_url: format!("{}/maps/api/geocode/json", server.url()),
        ..GeocodingConfig::default()
    }
}

#[tokio::test]
async fn test_geocoding_client_returns_candidates() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/maps/api/geocode/json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("address".into(), "1 Main St, FL, 33602".into()),
            Matcher::UrlEncoded("key".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "status": "OK",
                "results": [
                    {
                        "formatted_address": "1 Main St, Tampa, FL 33602, USA",
                        "geometry": {"location": {"lat": 27.9506, "lng": -82.4572}}
                    }
                ]
            }"#,
        )
        .create_async()
        .await;

    let client = GoogleGeocodingClient::new(&geocoding_config(&server)).unwrap();
    let candidates = client.candidates("1 Main St, FL, 33602").await.unwrap();

    mock.assert_async().await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].location.latitude, 27.9506);
    assert_eq!(candidates[0].location.longitude, -82.4572);
}

#[tokio::test]
async fn test_geocoding_client_zero_results() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/maps/api/geocode/json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status": "ZERO_RESULTS", "results": []}"#)
        .create_async()
        .await;

    let client = GoogleGeocodingClient::new(&geocoding_config(&server)).unwrap();
    let candidates = client.candidates("Nowhere").await.unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn test_geocoding_client_denied() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/maps/api/geocode/json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status": "REQUEST_DENIED", "results": [], "error_message": "bad key"}"#)
        .create_async()
        .await;

    let client = GoogleGeocodingClient::new(&geocoding_config(&server)).unwrap();
    let result = client.candidates("1 Main St").await;
    assert!(matches!(result, Err(CareFinderError::Geocode { .. })));
}

fn address_request(endpoint: &str) -> DeviceAddressRequest<'_> {
    DeviceAddressRequest {
        api_endpoint: endpoint,
        device_id: "device-1",
        consent_token: "token-123",
    }
}

#[tokio::test]
async fn test_device_address_full_address() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/devices/device-1/settings/address")
        .match_header("authorization", "Bearer token-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "addressLine1": "410 Terry Ave North",
                "city": "Seattle",
                "stateOrRegion": "WA",
                "postalCode": "98109",
                "countryCode": "US"
            }"#,
        )
        .create_async()
        .await;

    let client = DeviceAddressClient::new(&DeviceAddressConfig::default()).unwrap();
    let url = server.url();
    let address = client.full_address(&address_request(&url)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(address.to_query().unwrap(), "410 Terry Ave North, WA, 98109");
}

#[tokio::test]
async fn test_device_address_country_and_postal_code() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            "/v1/devices/device-1/settings/address/countryAndPostalCode",
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"countryCode": "US", "postalCode": "98109"}"#)
        .create_async()
        .await;

    let client = DeviceAddressClient::new(&DeviceAddressConfig::default()).unwrap();
    let url = server.url();
    let result = client
        .country_and_postal_code(&address_request(&url))
        .await
        .unwrap();

    assert_eq!(result.country_code.as_deref(), Some("US"));
    assert_eq!(result.postal_code.as_deref(), Some("98109"));
}

#[tokio::test]
async fn test_device_address_status_mapping() {
    let mut server = mockito::Server::new_async().await;
    let client = DeviceAddressClient::new(&DeviceAddressConfig::default()).unwrap();
    let url = server.url();

    let no_content = server
        .mock("GET", "/v1/devices/device-1/settings/address")
        .with_status(204)
        .create_async()
        .await;
    let result = client.full_address(&address_request(&url)).await;
    assert!(matches!(result, Err(CareFinderError::NoAddress)));
    no_content.remove_async().await;

    let forbidden = server
        .mock("GET", "/v1/devices/device-1/settings/address")
        .with_status(403)
        .create_async()
        .await;
    let result = client.full_address(&address_request(&url)).await;
    assert!(matches!(
        result,
        Err(CareFinderError::MissingPermission { .. })
    ));
    forbidden.remove_async().await;

    server
        .mock("GET", "/v1/devices/device-1/settings/address")
        .with_status(500)
        .create_async()
        .await;
    let result = client.full_address(&address_request(&url)).await;
    assert!(matches!(result, Err(CareFinderError::AddressApi { .. })));
}
