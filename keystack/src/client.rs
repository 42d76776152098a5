//! Client lifecycle
//!
//! A [`Client`] owns one core-side client identifier. The identifier is
//! released exactly once: on [`Client::close`], or when the last clone is
//! dropped. Invocations hold a lease on the client; a close that races with
//! in-flight invocations rejects new calls immediately and releases the
//! identifier when the last lease ends.

use keystack_core::{shared_core, ClientConfig, Context, Core};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::invoke;
use crate::options::{build_config, ClientOption};
use crate::secrets::SecretsSource;

#[derive(Debug, Default)]
struct LeaseState {
    closed: bool,
    in_flight: usize,
    release_issued: bool,
}

impl LeaseState {
    /// Mark the release as issued if it is due now
    fn take_release(&mut self) -> bool {
        if self.closed && self.in_flight == 0 && !self.release_issued {
            self.release_issued = true;
            true
        } else {
            false
        }
    }
}

/// The core-side client bound to its engine
pub(crate) struct InnerClient {
    id: u64,
    core: Arc<dyn Core>,
    state: Mutex<LeaseState>,
}

impl InnerClient {
    fn new(id: u64, core: Arc<dyn Core>) -> Self {
        Self {
            id,
            core,
            state: Mutex::new(LeaseState::default()),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn core(&self) -> &dyn Core {
        self.core.as_ref()
    }

    /// Register an in-flight invocation
    pub(crate) fn lease(&self) -> Result<Lease<'_>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::ClientReleased);
        }
        state.in_flight += 1;
        Ok(Lease { client: self })
    }

    /// Reject new invocations; true if the release is due now
    fn mark_closed(&self) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.closed = true;
        if state.in_flight > 0 {
            debug!(
                client_id = self.id,
                in_flight = state.in_flight,
                "deferring client release"
            );
        }
        state.take_release()
    }

    fn close(&self) {
        if self.mark_closed() {
            self.release();
        }
    }

    async fn shutdown(&self, ctx: &Context) -> Result<()> {
        if !self.mark_closed() {
            return Ok(());
        }

        debug!(client_id = self.id, "releasing core-side client");
        ctx.run(self.core.release_client_now(ctx, self.id))
            .await
            .map_err(Error::Release)
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn release(&self) {
        debug!(client_id = self.id, "releasing core-side client");
        self.core.release_client(self.id);
    }
}

impl Drop for InnerClient {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.closed = true;
        if state.take_release() {
            self.release();
        }
    }
}

/// Keeps a client from being released while an invocation is in flight
pub(crate) struct Lease<'a> {
    client: &'a InnerClient,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        let release = {
            let mut state = self.client.state.lock();
            state.in_flight -= 1;
            state.take_release()
        };

        if release {
            self.client.release();
        }
    }
}

/// A client of the shared core engine
///
/// Clones share the same core-side client.
#[derive(Clone)]
pub struct Client {
    inner: Arc<InnerClient>,
}

impl Client {
    /// Create a client on the process-wide shared core engine
    pub async fn new(
        ctx: &Context,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self> {
        // Fail on bad options before touching the engine.
        let config = build_config(options)?;
        let core = ctx
            .run(shared_core())
            .await
            .map_err(Error::EngineInitialization)?;
        Self::init(ctx, core, config).await
    }

    /// Create a client on a specific core engine
    pub async fn with_core(
        ctx: &Context,
        core: Arc<dyn Core>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self> {
        let config = build_config(options)?;
        Self::init(ctx, core, config).await
    }

    async fn init(ctx: &Context, core: Arc<dyn Core>, config: ClientConfig) -> Result<Self> {
        let id = ctx
            .run(core.init_client(ctx, &config))
            .await
            .map_err(Error::ClientInitialization)?;

        info!(
            client_id = id,
            integration_name = %config.integration_name,
            integration_version = %config.integration_version,
            "client initialized"
        );

        Ok(Self {
            inner: Arc::new(InnerClient::new(id, core)),
        })
    }

    /// The core-side client identifier
    pub fn id(&self) -> u64 {
        self.inner.id()
    }

    /// Invoke a core method; the payload is returned undecoded
    ///
    /// Parameters are joined with [`PARAMETER_SEPARATOR`](crate::PARAMETER_SEPARATOR).
    pub async fn invoke<S: AsRef<str>>(
        &self,
        ctx: &Context,
        method: &str,
        params: &[S],
    ) -> Result<String> {
        invoke::client_invoke(ctx, &self.inner, method, params).await
    }

    /// Operations on secrets
    pub fn secrets(&self) -> SecretsSource {
        SecretsSource::new(Arc::clone(&self.inner))
    }

    /// Release the core-side client
    ///
    /// Further invocations fail with [`Error::ClientReleased`]. Calling
    /// `close` more than once has no effect.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Release the core-side client and wait for the engine to confirm
    ///
    /// Use this before the async runtime shuts down; [`Client::close`] only
    /// schedules the release. When invocations are still in flight the
    /// release is deferred to the last of them, as with `close`.
    pub async fn shutdown(&self, ctx: &Context) -> Result<()> {
        self.inner.shutdown(ctx).await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.inner.id)
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}
