//! The call contract of the shared core engine

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::CoreError;

/// One named call with its encoded parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invocation {
    pub method_name: String,
    pub parameters: String,
}

/// An invocation addressed to a core-side client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvokeConfig {
    #[serde(rename = "ClientID")]
    pub client_id: u64,
    pub invocation: Invocation,
}

/// Shared core engine
///
/// Implementations are used concurrently by every client in the process.
#[async_trait]
pub trait Core: Send + Sync {
    /// Create a core-side client and return its identifier
    async fn init_client(&self, ctx: &Context, config: &ClientConfig) -> Result<u64, CoreError>;

    /// Run one invocation and return the engine's raw payload
    async fn invoke(&self, ctx: &Context, request: &InvokeConfig) -> Result<String, CoreError>;

    /// Release a core-side client. Fire-and-forget.
    fn release_client(&self, client_id: u64);

    /// Release a core-side client and wait until the engine has it
    ///
    /// Engines whose `release_client` completes synchronously keep the
    /// default.
    async fn release_client_now(&self, _ctx: &Context, client_id: u64) -> Result<(), CoreError> {
        self.release_client(client_id);
        Ok(())
    }
}
