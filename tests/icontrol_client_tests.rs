// Integration tests for the appliance REST connector using wiremock.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lbsync::adapter::outbound::icontrol::IControlConnector;
use lbsync::error::Error;
use lbsync::infrastructure::config::device::DeviceConfig;
use lbsync::port::outbound::device::{DeviceConnector, DeviceHandle};

// ── Helpers ─────────────────────────────────────────────────────────

const HOST: &str = "127.0.0.1";

fn connector_for(server: &MockServer) -> IControlConnector {
    let config = DeviceConfig {
        username: "admin".to_string(),
        password: Some("secret".to_string()),
        scheme: "http".to_string(),
        port: server.address().port(),
        timeout_ms: 2_000,
        accept_invalid_certs: false,
    };
    IControlConnector::from_config(&config).unwrap()
}

async fn mount_failover(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/cm/failover-status"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "kind": "tm:cm:failover-status" })),
        )
        .mount(server)
        .await;
}

async fn setup() -> (MockServer, Arc<dyn DeviceHandle>) {
    let server = MockServer::start().await;
    mount_failover(&server).await;
    let handle = connector_for(&server).connect(HOST).await.unwrap();
    (server, handle)
}

// ── Connection ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_probes_failover_status() {
    let (_server, handle) = setup().await;

    assert_eq!(handle.hostname(), HOST);
    assert!(handle.is_alive().await);
}

#[tokio::test]
async fn test_connect_fails_when_probe_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/cm/failover-status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = connector_for(&server).connect(HOST).await;

    match result {
        Err(err @ Error::Connection(_)) => assert!(err.is_device_unreachable()),
        Err(other) => panic!("expected Connection, got: {other:?}"),
        Ok(_) => panic!("expected Connection, got a handle"),
    }
}

#[tokio::test]
async fn test_connect_unresolvable_host() {
    let server = MockServer::start().await;

    let result = connector_for(&server).connect("lb.invalid").await;

    match result {
        Err(err @ Error::HostNotFound(_)) => assert!(err.is_device_unreachable()),
        Err(other) => panic!("expected HostNotFound, got: {other:?}"),
        Ok(_) => panic!("expected HostNotFound, got a handle"),
    }
}

#[tokio::test]
async fn test_connect_host_that_cannot_form_a_url() {
    let server = MockServer::start().await;

    // Resolves as an IPv6 literal but is not a valid URL authority unbracketed.
    let result = connector_for(&server).connect("::1").await;

    match result {
        Err(err @ Error::Connection(_)) => assert!(err.is_device_unreachable()),
        Err(other) => panic!("expected Connection, got: {other:?}"),
        Ok(_) => panic!("expected Connection, got a handle"),
    }
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_node_enabled_reads_session() {
    let (server, handle) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/node/~Common~web01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "web01",
            "partition": "Common",
            "session": "user-disabled",
            "state": "unchecked",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/node/web02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "web02",
            "session": "monitor-enabled",
        })))
        .mount(&server)
        .await;

    assert!(!handle.node_enabled("/Common/web01").await.unwrap());
    assert!(handle.node_enabled("web02").await.unwrap());
}

#[tokio::test]
async fn test_node_enabled_unknown_node() {
    let (server, handle) = setup().await;

    Mock::given(method("GET"))
        .and(path("/mgmt/tm/ltm/node/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "01020036:3: The requested Node (/Common/ghost) was not found.",
        })))
        .mount(&server)
        .await;

    let result = handle.node_enabled("ghost").await;

    match result {
        Err(err @ Error::NotFound(_)) => assert!(!err.is_device_unreachable()),
        other => panic!("expected NotFound, got: {other:?}"),
    }
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_node_enabled_patches_session() {
    let (server, handle) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/mgmt/tm/ltm/node/web01"))
        .and(body_json(json!({ "session": "user-disabled" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "session": "user-disabled" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    handle.set_node_enabled("web01", false).await.unwrap();
}

#[tokio::test]
async fn test_set_poolmember_enabled_targets_member_path() {
    let (server, handle) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/mgmt/tm/ltm/pool/~Common~web/members/web01:8080"))
        .and(body_json(json!({ "session": "user-enabled" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "session": "user-enabled" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    handle
        .set_poolmember_enabled("web01", 8080, "/Common/web", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_poolmember_enabled_missing_member() {
    let (server, handle) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/mgmt/tm/ltm/pool/~Common~web/members/web09:80"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = handle
        .set_poolmember_enabled("web09", 80, "/Common/web", false)
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))), "got: {result:?}");
}

#[tokio::test]
async fn test_server_error_surfaces_as_http_error() {
    let (server, handle) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/mgmt/tm/ltm/node/web01"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = handle.set_node_enabled("web01", true).await;

    match result {
        Err(err @ Error::Http(_)) => assert!(!err.is_device_unreachable()),
        other => panic!("expected Http, got: {other:?}"),
    }
}
