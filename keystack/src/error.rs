//! SDK error types

use keystack_core::CoreError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while building a client configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnvironment(String),

    #[error("invalid value for {option}: {reason}")]
    Invalid { option: String, reason: String },

    #[error("failed to read settings: {0}")]
    Settings(#[from] config::ConfigError),
}

/// Errors returned by the SDK
#[derive(Debug, Error)]
pub enum Error {
    #[error("error starting core engine: {0}")]
    EngineInitialization(#[source] CoreError),

    #[error("invalid client configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("error initializing client: {0}")]
    ClientInitialization(#[source] CoreError),

    #[error("{method} failed: {source}")]
    Invocation {
        method: String,
        #[source]
        source: CoreError,
    },

    #[error("invalid parameters for {method}: {reason}")]
    InvalidParameters { method: String, reason: String },

    #[error("client has been released")]
    ClientReleased,

    #[error("error releasing client: {0}")]
    Release(#[source] CoreError),

    #[error("failed to decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// The underlying core error, for failures reported across the boundary
    pub fn core_error(&self) -> Option<&CoreError> {
        match self {
            Self::EngineInitialization(e)
            | Self::ClientInitialization(e)
            | Self::Release(e) => Some(e),
            Self::Invocation { source, .. } => Some(source),
            _ => None,
        }
    }
}
