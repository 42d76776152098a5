//! Settings for reaching the shared core engine

use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::CoreError;

pub const DEFAULT_CORE_ENDPOINT: &str = "http://127.0.0.1:7171";

/// Core transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct CoreSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_CORE_ENDPOINT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl CoreSettings {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Load settings from an optional `keystack-core` file and `KEYSTACK_CORE_*` variables
    pub fn load() -> Result<Self, CoreError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("keystack-core").required(false))
            .add_source(config::Environment::with_prefix("KEYSTACK_CORE"))
            .build()
            .and_then(|config| config.try_deserialize::<CoreSettings>())
            .map_err(|e| CoreError::NotConfigured(e.to_string()))?;

        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The endpoint as a validated base URL
    pub fn endpoint_url(&self) -> Result<Url, CoreError> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            CoreError::NotConfigured(format!("invalid core endpoint '{}': {}", self.endpoint, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(CoreError::NotConfigured(format!(
                "unsupported core endpoint scheme: {scheme}"
            ))),
        }
    }
}
