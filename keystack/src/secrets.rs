//! Secrets facade

use async_trait::async_trait;
use keystack_core::Context;
use std::sync::Arc;

use crate::client::InnerClient;
use crate::error::{Error, Result};
use crate::invoke::client_invoke;

/// Operations the client can perform on secrets
#[async_trait]
pub trait SecretsApi: Send + Sync {
    /// Resolve the secret a secret reference points to
    ///
    /// Secret references have the form
    /// `op://<vault-name>/<item-name>[/<section-name>]/<field-name>`.
    async fn resolve(&self, ctx: &Context, secret_reference: &str) -> Result<String>;
}

/// [`SecretsApi`] backed by a client
#[derive(Clone)]
pub struct SecretsSource {
    inner: Arc<InnerClient>,
}

impl SecretsSource {
    pub(crate) fn new(inner: Arc<InnerClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl SecretsApi for SecretsSource {
    async fn resolve(&self, ctx: &Context, secret_reference: &str) -> Result<String> {
        const METHOD: &str = "Resolve";

        let payload = client_invoke(ctx, &self.inner, METHOD, &[secret_reference]).await?;
        serde_json::from_str::<String>(&payload).map_err(|source| Error::Decode {
            method: METHOD.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for SecretsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsSource")
            .field("client_id", &self.inner.id())
            .finish()
    }
}
