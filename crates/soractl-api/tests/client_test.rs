// Integration tests for `ApiClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use soractl_api::{
    ApiClient, Credentials, Error, FetchOptions, PortMappingRequest, SpeedClass,
    SubscriberFilters, TransportConfig, authenticate,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let credentials = Credentials::new("test-api-key", "test-token");
    let client = ApiClient::new(
        server.uri().parse().expect("mock server uri"),
        &credentials,
        &TransportConfig::default(),
    )
    .expect("client");
    (server, client)
}

/// Fetch options with millisecond backoffs so retry tests don't sleep.
fn fast_opts() -> FetchOptions {
    FetchOptions {
        page_size: 2,
        max_retries: 3,
        retry_backoff: Duration::from_millis(1),
        connect_backoff: Duration::from_millis(1),
    }
}

fn record(imsi: &str) -> serde_json::Value {
    json!({ "imsi": imsi, "online": true })
}

// ── Pagination ──────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_all_concatenates_pages_in_order() {
    let (server, client) = setup().await;

    // Keyed pages first: wiremock matches mocks in mount order.
    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .and(query_param("last_evaluated_key", "k1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-soracom-next-key", "k2")
                .set_body_json(json!([record("3"), record("4")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .and(query_param("last_evaluated_key", "k2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([record("5")])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-soracom-next-key", "k1")
                .set_body_json(json!([record("1"), record("2")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = client
        .fetch_all_subscribers(&SubscriberFilters::default(), &fast_opts())
        .await
        .expect("fetch");

    let imsis: Vec<&str> = records.iter().filter_map(|r| r.str_field("imsi")).collect();
    assert_eq!(imsis, ["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn fetch_all_stops_on_empty_page_even_with_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-soracom-next-key", "k1")
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = client
        .fetch_all_subscribers(&SubscriberFilters::default(), &fast_opts())
        .await
        .expect("fetch");

    assert!(records.is_empty());
}

// ── Retry policy ────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_all_retries_exactly_max_retries_then_returns_partial() {
    let (server, client) = setup().await;

    // 1 initial attempt + 3 retries = 4 requests, then give up.
    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let records = client
        .fetch_all_subscribers(&SubscriberFilters::default(), &fast_opts())
        .await
        .expect("partial results, not an error");

    assert!(records.is_empty());
}

#[tokio::test]
async fn fetch_all_keeps_accumulated_pages_on_exhaustion() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .and(query_param("last_evaluated_key", "k1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-soracom-next-key", "k1")
                .set_body_json(json!([record("1"), record("2")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = client
        .fetch_all_subscribers(&SubscriberFilters::default(), &fast_opts())
        .await
        .expect("partial results");

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn fetch_all_aborts_immediately_on_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .fetch_all_subscribers(&SubscriberFilters::default(), &fast_opts())
        .await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication, got: {result:?}"
    );
}

#[tokio::test]
async fn list_page_passes_filters_as_query_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .and(query_param("limit", "500"))
        .and(query_param("status_filter", "active"))
        .and(query_param("tag_name", "fleet"))
        .and(query_param("tag_value", "east"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([record("1")])))
        .expect(1)
        .mount(&server)
        .await;

    let filters = SubscriberFilters {
        status_filter: Some("active".into()),
        tag_name: Some("fleet".into()),
        tag_value: Some("east".into()),
    };

    let (records, next) = client
        .list_subscribers_page(500, None, &filters)
        .await
        .expect("page");

    assert_eq!(records.len(), 1);
    assert!(next.is_none());
}

// ── Speed class ─────────────────────────────────────────────────────

#[tokio::test]
async fn update_speed_class_accepts_204() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/subscribers/440101234567890/update_speed_class"))
        .and(body_json(json!({ "speedClass": "s1.fast" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .update_speed_class("440101234567890", SpeedClass::Fast)
        .await
        .expect("speed class update");
}

#[tokio::test]
async fn update_speed_class_surfaces_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/subscribers/440101234567890/update_speed_class"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown speed class"))
        .mount(&server)
        .await;

    let result = client
        .update_speed_class("440101234567890", SpeedClass::Slow)
        .await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "unknown speed class");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Port mappings ───────────────────────────────────────────────────

#[tokio::test]
async fn create_port_mapping_requires_201() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/port_mappings"))
        .and(body_json(json!({
            "destination": { "imsi": "440101234567890", "port": 22 },
            "duration": 3600,
            "ipRanges": ["203.0.113.7/32"],
            "tlsRequired": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "map-1",
            "hostname": "gate.example.net",
            "port": 40123
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request =
        PortMappingRequest::ssh("440101234567890", 3600, Some("203.0.113.7/32".into()));
    let mapping = client.create_port_mapping(&request).await.expect("mapping");

    assert_eq!(mapping.id, "map-1");
    assert_eq!(mapping.hostname, "gate.example.net");
    assert_eq!(mapping.port, 40123);
}

#[tokio::test]
async fn create_port_mapping_defaults_to_open_range() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/port_mappings"))
        .and(body_json(json!({
            "destination": { "imsi": "440101234567890", "port": 22 },
            "duration": 3600,
            "ipRanges": ["0.0.0.0/0"],
            "tlsRequired": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "map-2",
            "hostname": "gate.example.net",
            "port": 40124
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = PortMappingRequest::ssh("440101234567890", 3600, None);
    client.create_port_mapping(&request).await.expect("mapping");
}

#[tokio::test]
async fn create_port_mapping_rejects_non_201_with_raw_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/port_mappings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("imsi not found"))
        .mount(&server)
        .await;

    let request = PortMappingRequest::ssh("000000000000000", 3600, None);
    let result = client.create_port_mapping(&request).await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert!(message.contains("imsi"), "raw body preserved: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn delete_port_mapping_treats_404_as_already_gone() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/port_mappings/map-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_port_mapping("map-1").await.expect("already gone is fine");
}

#[tokio::test]
async fn delete_port_mapping_fails_on_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/port_mappings/map-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.delete_port_mapping("map-1").await;
    assert!(matches!(result, Err(Error::Api { status: 500, .. })));
}

// ── Tags ────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_delete_tag() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/subscribers/440101234567890/tags"))
        .and(body_json(json!([{ "tagName": "Note", "tagValue": "rooftop unit" }])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/subscribers/440101234567890/tags"))
        .and(body_json(json!({ "tagNames": ["Note"] })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .put_tag("440101234567890", "Note", "rooftop unit")
        .await
        .expect("put tag");
    client
        .delete_tag("440101234567890", "Note")
        .await
        .expect("delete tag");
}

#[tokio::test]
async fn get_subscriber_returns_record_with_tags() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/subscribers/440101234567890"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "imsi": "440101234567890",
            "tags": { "name": "Pump-1", "S/W Version": "2.4.1" }
        })))
        .mount(&server)
        .await;

    let record = client.get_subscriber("440101234567890").await.expect("subscriber");
    assert_eq!(record.tag("name"), Some("Pump-1"));
    assert_eq!(record.tag("S/W Version"), Some("2.4.1"));
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn authenticate_returns_credential_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({ "email": "ops@example.com", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiKey": "key-123",
            "token": "tok-456",
            "operatorId": "OP0012345678"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = authenticate(
        &server.uri().parse().expect("uri"),
        "ops@example.com",
        &secrecy::SecretString::from("hunter2"),
        &TransportConfig::default(),
    )
    .await
    .expect("authenticate");

    // Use the pair against an authed endpoint to confirm headers round-trip.
    let client = ApiClient::new(
        server.uri().parse().expect("uri"),
        &credentials,
        &TransportConfig::default(),
    )
    .expect("client");

    Mock::given(method("GET"))
        .and(path("/subscribers/1"))
        .and(wiremock::matchers::header("x-soracom-api-key", "key-123"))
        .and(wiremock::matchers::header("x-soracom-token", "tok-456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "imsi": "1" })))
        .expect(1)
        .mount(&server)
        .await;

    client.get_subscriber("1").await.expect("authed request");
}

#[tokio::test]
async fn authenticate_rejects_bad_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad login"))
        .mount(&server)
        .await;

    let result = authenticate(
        &server.uri().parse().expect("uri"),
        "ops@example.com",
        &secrecy::SecretString::from("wrong"),
        &TransportConfig::default(),
    )
    .await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
}
