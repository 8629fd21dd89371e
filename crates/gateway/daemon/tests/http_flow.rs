//! Full operation lifecycle over HTTP against the simulated network.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use gateway_commit::{CommitConfig, Gateway};
use gateway_daemon::api::{create_router, AppState};
use gateway_daemon::config::NetworkConfig;
use gateway_daemon::sim::{build_provider, SimNetwork};
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PEER0: &str = "peer0.org1.example.com";
const PEER1: &str = "peer1.org1.example.com";

fn app(network: NetworkConfig) -> Router {
    let provider = build_provider(&network, Arc::new(SimNetwork::new(&network)));
    let gateway = Gateway::new(Arc::new(provider), CommitConfig::default());
    create_router(AppState::new(Arc::new(gateway)), false)
}

fn fast_network() -> NetworkConfig {
    NetworkConfig {
        latency_ms: 0,
        ..NetworkConfig::default()
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-org-name", "org1")
        .header("x-user-name", "admin")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .header("x-org-name", "org1")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn channel_config_file() -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "gateway-http-flow-{}-{}.tx",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::write(&path, b"channel config envelope").unwrap();
    path
}

async fn create_and_join(app: &Router) {
    create_and_join_peers(app, &[PEER0, PEER1]).await;
}

async fn create_and_join_peers(app: &Router, peers: &[&str]) {
    let config_path = channel_config_file();
    let (status, body) = post(
        app,
        "/channels",
        json!({
            "channelName": "mychannel",
            "channelConfigPath": config_path.to_string_lossy(),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Channel 'mychannel' created Successfully");
    let _ = std::fs::remove_file(config_path);

    let (status, body) = post(
        app,
        "/channels/mychannel/peers",
        json!({ "peers": peers }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body["message"],
        "Successfully joined peers in organization org1 to the channel:mychannel"
    );
}

async fn install(app: &Router, peers: &[&str]) -> (StatusCode, Value) {
    post(
        app,
        "/chaincodes",
        json!({
            "peers": peers,
            "chaincodeName": "salmon",
            "chaincodePath": "github.com/hdnha11/salmon_supply_chain",
            "chaincodeVersion": "v0",
            "chaincodeType": "golang",
        }),
    )
    .await
}

async fn instantiate(app: &Router, peers: &[&str]) -> (StatusCode, Value) {
    post(
        app,
        "/channels/mychannel/chaincodes",
        json!({
            "peers": peers,
            "chaincodeName": "salmon",
            "chaincodeVersion": "v0",
            "chaincodeType": "golang",
            "args": [],
        }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_lifecycle() {
    let app = app(fast_network());
    create_and_join(&app).await;

    let (status, body) = install(&app, &[PEER0, PEER1]).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Successfully install chaincode");

    // No peers: the organization's default endorsers are used.
    let (status, body) = instantiate(&app, &[]).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body["message"],
        "Successfully instantiate chaincode in organization org1 to the channel 'mychannel'"
    );

    let (status, body) = post(
        &app,
        "/channels/mychannel/chaincodes/salmon",
        json!({
            "peers": [PEER0, PEER1],
            "fcn": "recordSalmon",
            "args": ["salmon-1", r#"{"weight":12,"holder":"fredrick"}"#],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let tx_id = body["tx_id"].as_str().unwrap().to_string();
    assert_eq!(
        body["message"],
        format!(
            "Successfully invoked the chaincode salmon to the channel 'mychannel' for transaction ID: {}",
            tx_id
        )
    );

    // args=['salmon-1']
    let (status, body) = get(
        &app,
        &format!(
            "/channels/mychannel/chaincodes/salmon?peer={}&fcn=querySalmon&args=%5B%27salmon-1%27%5D",
            PEER0
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["weight"], 12);
    assert_eq!(body["holder"], "fredrick");

    let (status, body) = get(
        &app,
        &format!("/channels/mychannel/transactions/{}?peer={}", tx_id, PEER1),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["validation_code"], "VALID");
    assert_eq!(body["block_number"], 2);

    let (status, body) = get(&app, &format!("/channels/mychannel?peer={}", PEER0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["height"], 3);

    let (status, body) = get(&app, &format!("/channels/mychannel/blocks/0?peer={}", PEER0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number"], 0);

    let (status, body) = get(&app, &format!("/chaincodes?peer={}&type=installed", PEER1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "salmon");

    let (status, body) = get(
        &app,
        &format!("/chaincodes?peer={}&type=instantiated&channel=mychannel", PEER0),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["path"], "github.com/hdnha11/salmon_supply_chain");

    let (status, body) = get(&app, &format!("/channels?peer={}", PEER0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["mychannel"]));
}

#[tokio::test]
async fn test_duplicate_channel_creation_fails() {
    let app = app(fast_network());
    create_and_join(&app).await;

    let config_path = channel_config_file();
    let (status, body) = post(
        &app,
        "/channels",
        json!({
            "channelName": "mychannel",
            "channelConfigPath": config_path.to_string_lossy(),
        }),
    )
    .await;
    let _ = std::fs::remove_file(config_path);

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to create the channel 'mychannel'");
}

#[tokio::test]
async fn test_reinstall_is_rejected_by_every_peer() {
    let app = app(fast_network());
    create_and_join(&app).await;

    let (status, _) = install(&app, &[PEER0]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = install(&app, &[PEER0]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to install due to:"));
    assert!(error.contains("chaincode salmon:v0 already exists"));
}

#[tokio::test]
async fn test_partially_joined_channel_commits() {
    let app = app(fast_network());
    create_and_join_peers(&app, &[PEER0]).await;

    assert_eq!(install(&app, &[PEER0]).await.0, StatusCode::OK);

    let (status, body) = instantiate(&app, &[PEER0]).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = post(
        &app,
        "/channels/mychannel/chaincodes/salmon",
        json!({
            "peers": [PEER0],
            "fcn": "recordSalmon",
            "args": ["salmon-3", r#"{"weight":4,"holder":"fredrick"}"#],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    // args=['salmon-3']
    let (status, body) = get(
        &app,
        &format!(
            "/channels/mychannel/chaincodes/salmon?peer={}&fcn=querySalmon&args=%5B%27salmon-3%27%5D",
            PEER0
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["weight"], 4);

    // Default endorsers are the joined peers only.
    let (status, body) = post(
        &app,
        "/channels/mychannel/chaincodes/salmon",
        json!({
            "fcn": "recordSalmon",
            "args": ["salmon-4", r#"{"weight":9,"holder":"fredrick"}"#],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rejecting_peer_blocks_invoke() {
    let mut network = fast_network();
    network.faults.rejecting_peers = vec![PEER1.to_string()];
    let app = app(network);
    create_and_join(&app).await;

    assert_eq!(install(&app, &[PEER0]).await.0, StatusCode::OK);
    assert_eq!(instantiate(&app, &[PEER0]).await.0, StatusCode::OK);

    let (status, body) = post(
        &app,
        "/channels/mychannel/chaincodes/salmon",
        json!({
            "peers": [PEER0, PEER1],
            "fcn": "recordSalmon",
            "args": ["salmon-2", "7"],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with(
        "Failed to invoke chaincode. cause:Failed to send Proposal and receive all good ProposalResponse"
    ));
    assert!(error.contains(PEER1));

    // Nothing was ordered, so the key was never written.
    let (status, _) = get(
        &app,
        &format!(
            "/channels/mychannel/chaincodes/salmon?peer={}&fcn=querySalmon&args=%5B%22salmon-2%22%5D",
            PEER0
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_invoke_before_instantiate_fails() {
    let app = app(fast_network());
    create_and_join(&app).await;

    let (status, body) = post(
        &app,
        "/channels/mychannel/chaincodes/salmon",
        json!({ "peers": [PEER0], "fcn": "recordSalmon", "args": ["a", "b"] }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("has been successfully instantiated"));
}
