#![allow(dead_code)] // Test helpers appear unused when compiled independently

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use query_aggregator::{build_router, Aggregator, HolderClient, QueryRegistry, RetryConfig};
use reqwest::Client;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

const WAIT_ATTEMPTS: usize = 50;
const WAIT_DELAY: Duration = Duration::from_millis(100);

/// How a mock data holder answers `/run/aggregate`.
#[derive(Clone, Debug)]
pub enum HolderBehavior {
    /// Reply with `{"phone_data": records}`.
    Records(Vec<Value>),
    /// Reply with an arbitrary JSON body.
    Raw(Value),
    /// Reply with this status and an empty body.
    Status(u16),
    /// Sleep before replying with the records.
    Slow(Duration, Vec<Value>),
    /// Sleep on the first request only, then reply with the records.
    SlowOnce(Duration, Vec<Value>),
}

#[derive(Clone)]
struct HolderState {
    behavior: HolderBehavior,
    requests: Arc<Mutex<Vec<Value>>>,
}

pub struct MockHolder {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl MockHolder {
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// Find an available TCP port
pub async fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Best-effort check for whether binding to loopback is permitted in the current sandbox.
pub async fn can_bind_loopback() -> bool {
    match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => false,
        Err(_) => true, // treat other errors as non-fatal for skipping
    }
}

/// Spawn a mock data holder, return (handle, base URL)
pub async fn spawn_mock_holder(behavior: HolderBehavior) -> (MockHolder, String) {
    let state = HolderState {
        behavior,
        requests: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/run/aggregate", post(aggregate))
        .route("/requests", get(requests))
        .route("/health", get(health))
        .with_state(state);

    let port = free_port().await;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("failed to bind mock holder listener");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(err) = server.await {
            eprintln!("mock holder server error: {}", err);
        }
    });

    (
        MockHolder {
            shutdown_tx,
            handle,
        },
        format!("http://127.0.0.1:{}", port),
    )
}

/// Start the aggregator router on a free port and return its base URL.
pub async fn spawn_aggregator(holder_timeout: Duration) -> String {
    spawn_aggregator_with_retry(holder_timeout, RetryConfig::none()).await
}

/// Like `spawn_aggregator`, with `holder_timeout` applied to each attempt.
pub async fn spawn_aggregator_with_retry(holder_timeout: Duration, retry: RetryConfig) -> String {
    let session_timeout = retry.session_budget(holder_timeout);
    let holder = HolderClient::new(holder_timeout)
        .expect("failed to create holder client")
        .with_retry(retry);
    let aggregator =
        Aggregator::new(QueryRegistry::builtin(), holder).with_holder_timeout(session_timeout);
    let app = build_router(Arc::new(aggregator));

    let port = free_port().await;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("failed to bind aggregator listener");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://127.0.0.1:{}", port);
    wait_for_health(&Client::new(), &base_url).await;
    base_url
}

/// Wait for a server to respond to /health
pub async fn wait_for_health(client: &Client, base_url: &str) {
    poll_until(|| async {
        client
            .get(format!("{}/health", base_url))
            .send()
            .await
            .ok()
            .map(|_| ())
    })
    .await
    .unwrap_or_else(|| panic!("timed out waiting for {} to be healthy", base_url));
}

/// Requests the mock holder has received so far
pub async fn holder_requests(client: &Client, base_url: &str) -> Vec<Value> {
    client
        .get(format!("{}/requests", base_url))
        .send()
        .await
        .expect("failed to fetch holder requests")
        .json()
        .await
        .expect("holder requests were not JSON")
}

/// POST a query to the aggregator, returning (status, JSON body)
pub async fn send_query(client: &Client, aggregator_url: &str, body: Value) -> (u16, Value) {
    let resp = client
        .post(format!("{}/receive_query", aggregator_url))
        .json(&body)
        .send()
        .await
        .expect("failed to send query");
    let status = resp.status().as_u16();
    let body = resp.json().await.expect("response was not JSON");
    (status, body)
}

pub fn sum_query(holder_url: &str) -> Value {
    json!({
        "user_cloud_addr": holder_url,
        "query": {"query_type": "sum"},
        "agg": {}
    })
}

async fn poll_until<T, F, Fut>(mut f: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for _ in 0..WAIT_ATTEMPTS {
        if let Some(result) = f().await {
            return Some(result);
        }
        tokio::time::sleep(WAIT_DELAY).await;
    }
    None
}

async fn aggregate(
    State(state): State<HolderState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let seen = {
        let mut requests = state.requests.lock().await;
        requests.push(body);
        requests.len()
    };

    match state.behavior {
        HolderBehavior::Records(records) => Ok(Json(json!({ "phone_data": records }))),
        HolderBehavior::Raw(body) => Ok(Json(body)),
        HolderBehavior::Status(status) => {
            Err(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        }
        HolderBehavior::Slow(delay, records) => {
            tokio::time::sleep(delay).await;
            Ok(Json(json!({ "phone_data": records })))
        }
        HolderBehavior::SlowOnce(delay, records) => {
            if seen == 1 {
                tokio::time::sleep(delay).await;
            }
            Ok(Json(json!({ "phone_data": records })))
        }
    }
}

async fn requests(State(state): State<HolderState>) -> Json<Vec<Value>> {
    let requests = state.requests.lock().await;
    Json(requests.clone())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
