//! JSON-over-HTTP transport to an out-of-process core engine

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::context::Context;
use crate::engine::{Core, InvokeConfig};
use crate::error::CoreError;
use crate::request_id::REQUEST_ID_HEADER;
use crate::settings::CoreSettings;

/// Core engine reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpCore {
    base_url: String,
    client: Client,
}

impl HttpCore {
    /// Build the transport without contacting the engine
    pub fn new(settings: &CoreSettings) -> Result<Self, CoreError> {
        let endpoint = settings.endpoint_url()?;
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| CoreError::NotConfigured(e.to_string()))?;

        Ok(Self {
            base_url: endpoint.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build the transport and check that the engine answers
    pub async fn connect(settings: &CoreSettings) -> Result<Self, CoreError> {
        let core = Self::new(settings)?;
        core.health().await?;
        Ok(core)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the engine's health endpoint
    pub async fn health(&self) -> Result<(), CoreError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CoreError::Unavailable(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        path: &str,
        body: &T,
    ) -> Result<String, CoreError> {
        let url = format!("{}/{}", self.base_url, path);
        let request_id = ctx.request_id().cloned().unwrap_or_default();

        let mut request = self
            .client
            .post(&url)
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .json(body);
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }

        debug!(path = %path, request_id = %request_id, "core request");

        let response = ctx
            .run(async { request.send().await.map_err(CoreError::from) })
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            debug!(path = %path, request_id = %request_id, status = %status, "core returned error");
            Err(CoreError::from_json(&text))
        }
    }
}

#[async_trait]
impl Core for HttpCore {
    async fn init_client(&self, ctx: &Context, config: &ClientConfig) -> Result<u64, CoreError> {
        let body = self.post(ctx, "v1/init_client", config).await?;
        serde_json::from_str::<u64>(body.trim())
            .map_err(|e| CoreError::Protocol(format!("invalid client id '{}': {}", body.trim(), e)))
    }

    async fn invoke(&self, ctx: &Context, request: &InvokeConfig) -> Result<String, CoreError> {
        self.post(ctx, "v1/invoke", request).await
    }

    fn release_client(&self, client_id: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(client_id, "no async runtime available, skipping core-side release");
            return;
        };

        let core = self.clone();
        runtime.spawn(async move {
            if let Err(e) = core
                .release_client_now(&Context::background(), client_id)
                .await
            {
                warn!(client_id, error = %e, "failed to release core-side client");
            }
        });
    }

    async fn release_client_now(&self, ctx: &Context, client_id: u64) -> Result<(), CoreError> {
        self.post(ctx, "v1/release_client", &client_id).await?;
        Ok(())
    }
}
