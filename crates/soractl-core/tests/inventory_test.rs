// Inventory loading against a mocked provider and a temp-dir cache.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use soractl_api::{ApiClient, Credentials, TransportConfig};
use soractl_core::{CacheStore, Inventory};

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(
        server.uri().parse().expect("mock server uri"),
        &Credentials::new("test-api-key", "test-token"),
        &TransportConfig::default(),
    )
    .expect("client");
    (server, client)
}

fn store(dir: &TempDir) -> CacheStore {
    CacheStore::at_path(dir.path().join("devices_cache.json"))
}

async fn mount_inventory(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/subscribers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "imsi": "295051234567890", "name": "Pump-1", "online": true }
        ])))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_writes_back_even_when_cache_reads_are_disabled() {
    let (server, client) = setup().await;
    mount_inventory(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let cache = store(&dir);
    let inventory = Inventory::new(&client, cache.clone());

    let catalog = inventory.load(false, false).await.unwrap();
    assert_eq!(catalog.counts().total, 1);

    // The snapshot is there for a later cached invocation to reuse.
    assert_eq!(cache.read().unwrap().len(), 1);
}

#[tokio::test]
async fn fresh_cached_snapshot_short_circuits_the_network() {
    let (server, client) = setup().await;
    // No requests allowed: the cache must answer.
    mount_inventory(&server, 0).await;

    let dir = TempDir::new().unwrap();
    let cache = store(&dir);
    let records = vec![
        serde_json::from_value(json!({ "imsi": "295051234567890", "online": false })).unwrap(),
    ];
    cache.write(&records).unwrap();

    let inventory = Inventory::new(&client, cache);
    let catalog = inventory.load(true, false).await.unwrap();
    assert_eq!(catalog.counts().total, 1);
}

#[tokio::test]
async fn force_refresh_bypasses_a_valid_snapshot() {
    let (server, client) = setup().await;
    mount_inventory(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let cache = store(&dir);
    let stale = vec![
        serde_json::from_value(json!({ "imsi": "000000000000009", "online": false })).unwrap(),
    ];
    cache.write(&stale).unwrap();

    let inventory = Inventory::new(&client, cache);
    let catalog = inventory.load(true, true).await.unwrap();

    // The fetched record replaced the snapshot's.
    assert!(catalog.find_by_identity("295051234567890").is_some());
    assert!(catalog.find_by_identity("000000000000009").is_none());
}
