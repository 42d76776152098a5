//! Client configuration sent to the core engine at initialization

use serde::{Deserialize, Serialize};

pub const DEFAULT_INTEGRATION_NAME: &str = "Unknown";
pub const DEFAULT_INTEGRATION_VERSION: &str = "Unknown";

const PROGRAMMING_LANGUAGE: &str = "Rust";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
const REQUEST_LIBRARY_NAME: &str = "reqwest";
const REQUEST_LIBRARY_VERSION: &str = "0.11";
const DEFAULT_OS_VERSION: &str = "0.0.0";

/// Configuration for one core-side client
///
/// Only the token and integration identity are caller-settable; the
/// runtime identity fields describe this SDK build to the engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(rename = "serviceAccountToken")]
    pub token: String,
    pub integration_name: String,
    pub integration_version: String,
    programming_language: String,
    sdk_version: String,
    request_library_name: String,
    request_library_version: String,
    os: String,
    os_version: String,
    architecture: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            integration_name: DEFAULT_INTEGRATION_NAME.to_string(),
            integration_version: DEFAULT_INTEGRATION_VERSION.to_string(),
            programming_language: PROGRAMMING_LANGUAGE.to_string(),
            sdk_version: SDK_VERSION.to_string(),
            request_library_name: REQUEST_LIBRARY_NAME.to_string(),
            request_library_version: REQUEST_LIBRARY_VERSION.to_string(),
            os: std::env::consts::OS.to_string(),
            os_version: DEFAULT_OS_VERSION.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn sdk_version(&self) -> &str {
        &self.sdk_version
    }

    pub fn programming_language(&self) -> &str {
        &self.programming_language
    }
}

// Tokens must never reach logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ClientConfig")
            .field("token", &token)
            .field("integration_name", &self.integration_name)
            .field("integration_version", &self.integration_version)
            .field("programming_language", &self.programming_language)
            .field("sdk_version", &self.sdk_version)
            .field("os", &self.os)
            .field("architecture", &self.architecture)
            .finish_non_exhaustive()
    }
}
