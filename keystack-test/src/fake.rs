//! In-process fake core engine

use async_trait::async_trait;
use dashmap::DashMap;
use keystack_core::{ClientConfig, Context, Core, CoreError, ErrorCode, InvokeConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

type Handler = dyn Fn(&InvokeConfig) -> Result<String, CoreError> + Send + Sync;

/// Fake core engine
///
/// Tracks live clients, records init/invoke/release calls, and answers
/// `Resolve` from a table of known secrets unless a custom handler is set.
pub struct FakeCore {
    next_id: AtomicU64,
    init_calls: AtomicUsize,
    clients: DashMap<u64, ClientConfig>,
    secrets: DashMap<String, String>,
    invocations: Mutex<Vec<InvokeConfig>>,
    released: Mutex<Vec<u64>>,
    init_error: Option<(ErrorCode, String)>,
    latency: Option<Duration>,
    handler: Option<Box<Handler>>,
}

impl Default for FakeCore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            init_calls: AtomicUsize::new(0),
            clients: DashMap::new(),
            secrets: DashMap::new(),
            invocations: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            init_error: None,
            latency: None,
            handler: None,
        }
    }

    /// Make `init_client` fail with the given engine error
    pub fn failing_init(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
        self.init_error = Some((code, message.into()));
        self
    }

    /// Delay every invocation
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answer `Resolve` for `reference`
    pub fn with_secret(self, reference: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(reference.into(), value.into());
        self
    }

    /// Answer every invocation with `handler`
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&InvokeConfig) -> Result<String, CoreError> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Answer every invocation with the invocation itself as JSON
    pub fn echo(self) -> Self {
        self.with_handler(|request| {
            serde_json::to_string(&request.invocation)
                .map_err(|e| CoreError::engine(ErrorCode::Internal, e.to_string()))
        })
    }

    /// Number of `init_client` calls, successful or not
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Configuration a live client was initialized with
    pub fn client_config(&self, client_id: u64) -> Option<ClientConfig> {
        self.clients.get(&client_id).map(|c| c.value().clone())
    }

    pub fn live_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn invocations(&self) -> Vec<InvokeConfig> {
        self.invocations.lock().clone()
    }

    /// Client IDs in the order they were released
    pub fn released(&self) -> Vec<u64> {
        self.released.lock().clone()
    }

    fn resolve(&self, reference: &str) -> Result<String, CoreError> {
        let value = self.secrets.get(reference).ok_or_else(|| {
            CoreError::engine(
                ErrorCode::NotFound,
                format!("no secret matches reference {reference}"),
            )
        })?;

        serde_json::to_string(value.value())
            .map_err(|e| CoreError::engine(ErrorCode::Internal, e.to_string()))
    }
}

#[async_trait]
impl Core for FakeCore {
    async fn init_client(&self, _ctx: &Context, config: &ClientConfig) -> Result<u64, CoreError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);

        if let Some((code, message)) = &self.init_error {
            return Err(CoreError::engine(*code, message.clone()));
        }
        if config.token.is_empty() {
            return Err(CoreError::engine(
                ErrorCode::InvalidToken,
                "service account token is empty",
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.clients.insert(id, config.clone());
        debug!(client_id = id, "fake core client created");
        Ok(id)
    }

    async fn invoke(&self, _ctx: &Context, request: &InvokeConfig) -> Result<String, CoreError> {
        self.invocations.lock().push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.clients.contains_key(&request.client_id) {
            return Err(CoreError::engine(
                ErrorCode::InvalidClient,
                format!("unknown client {}", request.client_id),
            ));
        }

        if let Some(handler) = &self.handler {
            return handler(request);
        }

        match request.invocation.method_name.as_str() {
            "Resolve" => self.resolve(&request.invocation.parameters),
            other => Err(CoreError::engine(
                ErrorCode::InvalidRequest,
                format!("unknown method {other}"),
            )),
        }
    }

    fn release_client(&self, client_id: u64) {
        self.clients.remove(&client_id);
        self.released.lock().push(client_id);
        debug!(client_id, "fake core client released");
    }
}
