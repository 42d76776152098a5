//! Request ID generation

use uuid::Uuid;

/// Header carrying the request ID on core transport calls
pub const REQUEST_ID_HEADER: &str = "x-keystack-request-id";

/// Correlation ID for one call across the core boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string().to_uppercase())
    }

    /// Create a request ID with a specific value (for testing)
    pub fn with_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
