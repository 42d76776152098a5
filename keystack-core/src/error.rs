//! Core engine error types and formatting

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes reported by the core engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication
    InvalidToken,
    PermissionDenied,

    // Client lifecycle
    InvalidClient,

    // Requests
    NotFound,
    InvalidRequest,
    RateLimited,

    // Engine
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidToken => "InvalidToken",
            Self::PermissionDenied => "PermissionDenied",
            Self::InvalidClient => "InvalidClient",
            Self::NotFound => "NotFound",
            Self::InvalidRequest => "InvalidRequest",
            Self::RateLimited => "RateLimited",
            Self::Internal => "Internal",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse an engine error name; unrecognized names map to `Unknown`
    pub fn from_name(name: &str) -> Self {
        match name {
            "InvalidToken" => Self::InvalidToken,
            "PermissionDenied" => Self::PermissionDenied,
            "InvalidClient" => Self::InvalidClient,
            "NotFound" => Self::NotFound,
            "InvalidRequest" => Self::InvalidRequest,
            "RateLimited" => Self::RateLimited,
            "Internal" => Self::Internal,
            _ => Self::Unknown,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidToken => 401,
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::InvalidClient | Self::InvalidRequest => 400,
            Self::RateLimited => 429,
            Self::Internal | Self::Unknown => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors crossing the core boundary
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("core engine is not configured: {0}")]
    NotConfigured(String),

    #[error("core engine unavailable: {0}")]
    Unavailable(String),

    #[error("{code}: {message}")]
    Engine { code: ErrorCode, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed core response: {0}")]
    Protocol(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("shared core engine already initialized")]
    AlreadyInitialized,
}

/// Wire form of an engine error
#[derive(Debug, Serialize, Deserialize)]
struct EngineErrorBody {
    name: String,
    message: String,
}

impl CoreError {
    pub fn engine(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
        }
    }

    /// The engine error code, if this error came from the engine
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Parse an engine error body; anything unparsable is kept verbatim
    pub fn from_json(body: &str) -> Self {
        match serde_json::from_str::<EngineErrorBody>(body) {
            Ok(parsed) => Self::engine(ErrorCode::from_name(&parsed.name), parsed.message),
            Err(_) => Self::engine(ErrorCode::Unknown, body.trim()),
        }
    }

    /// Format as an engine error body
    pub fn to_json(&self) -> String {
        let (name, message) = match self {
            Self::Engine { code, message } => (code.as_str(), message.clone()),
            other => (ErrorCode::Internal.as_str(), other.to_string()),
        };

        let body = EngineErrorBody {
            name: name.to_string(),
            message,
        };

        serde_json::to_string(&body).unwrap_or_else(|_| {
            format!(r#"{{"name":"{}","message":"{}"}}"#, name, body.message)
        })
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::DeadlineExceeded
        } else if e.is_connect() {
            Self::Unavailable(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
