// Orchestrator behavior against a mocked provider, with a scripted fake
// in place of the ssh driver. The central property: speed restore and
// session close happen on every path that got as far as acquiring them.
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use soractl_api::{ApiClient, Credentials, TransportConfig};
use soractl_core::{
    CleanupContext, ConnectionInfo, CoreError, Device, RemoteCommandDriver, ScriptOutcome,
    UpdateOrchestrator, UpdateStatus,
};

const IMSI: &str = "295051234567890";

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

fn device() -> Device {
    Device::new(serde_json::from_value(json!({ "imsi": IMSI, "name": "Pump-1" })).unwrap())
}

/// Scripted driver standing in for the ssh implementation.
#[derive(Clone)]
struct FakeDriver {
    outcome: ScriptOutcome,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<ConnectionInfo>>>,
}

impl FakeDriver {
    fn returning(outcome: ScriptOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteCommandDriver for FakeDriver {
    async fn run_update(&mut self, conn: &ConnectionInfo) -> ScriptOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(conn.clone());
        self.outcome.clone()
    }
}

// ── Mock mounts ─────────────────────────────────────────────────────

async fn mount_speed(server: &MockServer, class: &str, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/subscribers/{IMSI}/update_speed_class")))
        .and(body_json(json!({ "speedClass": class })))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_create(server: &MockServer, status: u16, times: u64) {
    let template = if status == 201 {
        ResponseTemplate::new(201).set_body_json(json!({
            "id": "map-1",
            "hostname": "gate.example.net",
            "port": 40022
        }))
    } else {
        ResponseTemplate::new(status).set_body_string("no mapping for you")
    };
    Mock::given(method("POST"))
        .and(path("/port_mappings"))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_delete(server: &MockServer, times: u64) {
    Mock::given(method("DELETE"))
        .and(path("/port_mappings/map-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(times)
        .mount(server)
        .await;
}

// ── The happy path and script classifications ───────────────────────

#[tokio::test]
async fn completed_script_is_success_with_full_cleanup() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.fast", 200, 1).await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_create(&server, 201, 1).await;
    mount_delete(&server, 1).await;

    let driver = FakeDriver::returning(ScriptOutcome::Completed);
    let cleanup = Arc::new(CleanupContext::new());
    let mut orch = UpdateOrchestrator::new(&client, driver.clone(), Arc::clone(&cleanup));

    let outcome = orch.run_update(&device()).await.unwrap();
    assert_eq!(outcome.status, UpdateStatus::Succeeded);
    assert!(outcome.speed_restored);
    assert!(outcome.session_closed);
    assert_eq!(driver.call_count(), 1);

    let seen = driver.seen.lock().unwrap();
    assert_eq!(seen[0].hostname, "gate.example.net");
    assert_eq!(seen[0].port, 40022);

    // Everything released: nothing left for the interrupt handler.
    assert!(cleanup.is_empty().await);
}

#[tokio::test]
async fn reboot_detection_counts_as_success() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.fast", 200, 1).await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_create(&server, 201, 1).await;
    mount_delete(&server, 1).await;

    let driver = FakeDriver::returning(ScriptOutcome::RebootDetected);
    let mut orch =
        UpdateOrchestrator::new(&client, driver, Arc::new(CleanupContext::new()));

    let outcome = orch.run_update(&device()).await.unwrap();
    assert_eq!(outcome.status, UpdateStatus::Succeeded);
    assert!(outcome.speed_restored);
    assert!(outcome.session_closed);
}

#[tokio::test]
async fn timeout_is_reported_as_ambiguous_but_still_cleans_up() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.fast", 200, 1).await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_create(&server, 201, 1).await;
    mount_delete(&server, 1).await;

    let driver = FakeDriver::returning(ScriptOutcome::TimedOut);
    let mut orch =
        UpdateOrchestrator::new(&client, driver, Arc::new(CleanupContext::new()));

    let outcome = orch.run_update(&device()).await.unwrap();
    assert_eq!(outcome.status, UpdateStatus::AmbiguousTimeout);
    assert!(outcome.speed_restored);
    assert!(outcome.session_closed);
}

#[tokio::test]
async fn script_failure_is_reported_and_still_cleans_up() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.fast", 200, 1).await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_create(&server, 201, 1).await;
    mount_delete(&server, 1).await;

    let driver = FakeDriver::returning(ScriptOutcome::Failed("git clone failed".to_owned()));
    let mut orch =
        UpdateOrchestrator::new(&client, driver, Arc::new(CleanupContext::new()));

    let outcome = orch.run_update(&device()).await.unwrap();
    assert!(matches!(
        outcome.status,
        UpdateStatus::Failed(ref msg) if msg.contains("git clone")
    ));
    assert!(outcome.speed_restored);
    assert!(outcome.session_closed);
}

// ── Early bail-outs ─────────────────────────────────────────────────

#[tokio::test]
async fn raise_failure_is_nonfatal_and_update_proceeds() {
    let (server, client) = setup().await;
    // Raise fails, restore succeeds.
    mount_speed(&server, "s1.fast", 500, 1).await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_create(&server, 201, 1).await;
    mount_delete(&server, 1).await;

    let driver = FakeDriver::returning(ScriptOutcome::Completed);
    let mut orch = UpdateOrchestrator::new(
        &client,
        driver.clone(),
        Arc::new(CleanupContext::new()),
    );

    let outcome = orch.run_update(&device()).await.unwrap();
    assert_eq!(outcome.status, UpdateStatus::Succeeded);
    assert_eq!(driver.call_count(), 1);
    assert!(outcome.speed_restored);
}

#[tokio::test]
async fn session_open_failure_skips_script_but_restores_speed() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.fast", 200, 1).await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_create(&server, 429, 1).await;
    // No mapping was created, so nothing to delete.

    let driver = FakeDriver::returning(ScriptOutcome::Completed);
    let cleanup = Arc::new(CleanupContext::new());
    let mut orch = UpdateOrchestrator::new(&client, driver.clone(), Arc::clone(&cleanup));

    let outcome = orch.run_update(&device()).await.unwrap();
    assert!(matches!(outcome.status, UpdateStatus::Failed(_)));
    assert_eq!(driver.call_count(), 0);
    assert!(outcome.speed_restored);
    assert!(outcome.session_closed);
    assert!(cleanup.is_empty().await);
}

#[tokio::test]
async fn raise_and_open_both_failing_still_runs_full_release() {
    let (server, client) = setup().await;
    // Raise and open both fail; the restore must still go out.
    mount_speed(&server, "s1.fast", 500, 1).await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_create(&server, 429, 1).await;

    let driver = FakeDriver::returning(ScriptOutcome::Completed);
    let cleanup = Arc::new(CleanupContext::new());
    let mut orch = UpdateOrchestrator::new(&client, driver.clone(), Arc::clone(&cleanup));

    let outcome = orch.run_update(&device()).await.unwrap();
    assert!(matches!(outcome.status, UpdateStatus::Failed(_)));
    assert_eq!(driver.call_count(), 0);
    // The expect(1) on the slow mock verifies the restore was attempted;
    // closing the never-opened session is a no-op success.
    assert!(outcome.speed_restored);
    assert!(outcome.session_closed);
    assert!(cleanup.is_empty().await);
}

#[tokio::test]
async fn missing_identity_fails_before_any_request() {
    let (_server, client) = setup().await;
    let nameless = Device::new(serde_json::from_value(json!({ "name": "Pump-9" })).unwrap());

    let driver = FakeDriver::returning(ScriptOutcome::Completed);
    let mut orch = UpdateOrchestrator::new(
        &client,
        driver.clone(),
        Arc::new(CleanupContext::new()),
    );

    let err = orch.run_update(&nameless).await.unwrap_err();
    assert!(matches!(err, CoreError::MissingIdentity { .. }));
    assert_eq!(driver.call_count(), 0);
}

// ── Cleanup resilience ──────────────────────────────────────────────

#[tokio::test]
async fn failed_restore_still_closes_the_session() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.fast", 200, 1).await;
    mount_speed(&server, "s1.slow", 500, 1).await;
    mount_create(&server, 201, 1).await;
    mount_delete(&server, 1).await;

    let driver = FakeDriver::returning(ScriptOutcome::Completed);
    let cleanup = Arc::new(CleanupContext::new());
    let mut orch = UpdateOrchestrator::new(&client, driver, Arc::clone(&cleanup));

    let outcome = orch.run_update(&device()).await.unwrap();
    assert_eq!(outcome.status, UpdateStatus::Succeeded);
    assert!(!outcome.speed_restored);
    assert!(outcome.session_closed);

    // The restore is still owed; the ledger keeps it for the interrupt
    // handler or a later retry.
    assert!(!cleanup.is_empty().await);
}

#[tokio::test]
async fn interrupt_ledger_releases_tracked_resources() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.slow", 200, 1).await;
    mount_delete(&server, 1).await;

    let cleanup = CleanupContext::new();
    cleanup.track_speed_restore(IMSI).await;
    cleanup.track_mapping("map-1").await;

    cleanup.release(&client).await;
    assert!(cleanup.is_empty().await);

    // A second release finds nothing and makes no further calls; the
    // expect(1) counts above verify that on drop.
    cleanup.release(&client).await;
}

#[tokio::test]
async fn interrupt_ledger_attempts_delete_even_when_restore_fails() {
    let (server, client) = setup().await;
    mount_speed(&server, "s1.slow", 500, 1).await;
    mount_delete(&server, 1).await;

    let cleanup = CleanupContext::new();
    cleanup.track_speed_restore(IMSI).await;
    cleanup.track_mapping("map-1").await;

    cleanup.release(&client).await;
}
