//! Mock HTTP core endpoint

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use keystack_core::request_id::REQUEST_ID_HEADER;
use keystack_core::{ClientConfig, Context, Core, CoreError, InvokeConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::fake::FakeCore;

struct ServerState {
    core: Arc<FakeCore>,
    request_ids: Mutex<Vec<String>>,
    health_checks: AtomicUsize,
}

impl ServerState {
    fn record(&self, headers: &HeaderMap) {
        if let Some(id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
            self.request_ids.lock().push(id.to_string());
        }
    }
}

/// A running mock core endpoint
pub struct MockCoreServer {
    base_url: String,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockCoreServer {
    /// Serve `core` on a random local port
    pub async fn start(core: Arc<FakeCore>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(ServerState {
            core,
            request_ids: Mutex::new(Vec::new()),
            health_checks: AtomicUsize::new(0),
        });

        let router = Router::new()
            .route("/health", get(health))
            .route("/v1/init_client", post(init_client))
            .route("/v1/invoke", post(invoke))
            .route("/v1/release_client", post(release_client))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        info!(addr = %addr, "mock core server started");

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        })
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Request IDs received so far
    pub fn request_ids(&self) -> Vec<String> {
        self.state.request_ids.lock().clone()
    }

    /// Number of health probes served
    pub fn health_checks(&self) -> usize {
        self.state.health_checks.load(Ordering::SeqCst)
    }
}

impl Drop for MockCoreServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn error_response(error: &CoreError) -> Response {
    let status = error
        .code()
        .and_then(|code| StatusCode::from_u16(code.http_status()).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, error.to_json()).into_response()
}

async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.health_checks.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, r#"{"status": "running"}"#)
}

async fn init_client(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(config): Json<ClientConfig>,
) -> Response {
    state.record(&headers);
    match state.core.init_client(&Context::background(), &config).await {
        Ok(id) => Json(id).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn invoke(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(request): Json<InvokeConfig>,
) -> Response {
    state.record(&headers);
    match state.core.invoke(&Context::background(), &request).await {
        Ok(payload) => (StatusCode::OK, payload).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn release_client(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(client_id): Json<u64>,
) -> StatusCode {
    state.record(&headers);
    state.core.release_client(client_id);
    StatusCode::NO_CONTENT
}
