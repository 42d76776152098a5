//! Per-call context carrying an optional deadline and request ID

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::CoreError;
use crate::request_id::RequestId;

/// Caller-supplied call context
///
/// Cancellation is future drop; the context only carries the deadline the
/// caller is willing to wait until and the request ID sent to the engine.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    request_id: Option<RequestId>,
}

impl Context {
    /// A context without a deadline
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            request_id: None,
        }
    }

    /// Tag calls made with this context with `request_id`
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Await `fut`, giving up at the deadline
    pub async fn run<T, F>(&self, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        match self.deadline {
            Some(_) if self.is_expired() => Err(CoreError::DeadlineExceeded),
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .unwrap_or(Err(CoreError::DeadlineExceeded)),
            None => fut.await,
        }
    }
}
