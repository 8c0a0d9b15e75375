//! End-to-end test: real server on an ephemeral port, driven over HTTP.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio_test::{assert_err, assert_ok};

use farm_gateway::api::build_app;
use farm_gateway::app_state::AppState;
use farm_gateway::persistence::{FarmStore, MemoryStore, PondStore};

async fn spawn_server() -> SocketAddr {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Arc::clone(&store) as Arc<dyn FarmStore>,
        Arc::clone(&store) as Arc<dyn PondStore>,
        store,
        Duration::from_secs(5),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let app = build_app(state).into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn farms_and_ponds_round_trip() {
    let addr = spawn_server().await;
    let base = format!("http://{addr}/api/v1");
    let client = reqwest::Client::new();

    let ping: Value = client
        .get(format!("{base}/misc/ping"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ping["data"], "hello world");

    for name in ["Farm A", "Farm B", "Farm C"] {
        let res = client
            .post(format!("{base}/farms"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    }

    let res = client
        .post(format!("{base}/farms"))
        .json(&json!({ "name": "Farm B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["message"], "entity already existed");

    let list: Value = client
        .get(format!("{base}/farms?keyword=farm&limit=2&page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["data"]["farms"], json!([{ "id": 3, "name": "Farm C" }]));
    assert_eq!(list["data"]["meta"]["total_page"], 1);

    let res = client
        .post(format!("{base}/farms/2/ponds"))
        .json(&json!({ "name": "Pond A" }))
        .send()
        .await
        .unwrap();
    assert_ok!(res.error_for_status());

    let res = client
        .delete(format!("{base}/farms/2"))
        .send()
        .await
        .unwrap();
    assert_ok!(res.error_for_status());

    // The pond is hidden once its farm is gone.
    let res = client
        .get(format!("{base}/farms/2/ponds/1"))
        .send()
        .await
        .unwrap();
    assert_err!(res.error_for_status_ref());
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);

    let metrics: Value = client
        .get(format!("{base}/telemetry/request-metrics"))
        .header(reqwest::header::USER_AGENT, "e2e")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = metrics["data"]["request_metrics"].as_array().unwrap();
    let create = rows
        .iter()
        .find(|r| r["endpoint"] == "POST /api/v1/farms")
        .unwrap();
    assert_eq!(create["count"], 4);
}
