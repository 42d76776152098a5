//! Test utilities for keystack
//!
//! Provides stand-ins for the core engine:
//! - [`FakeCore`]: in-process engine that records every call
//! - [`MockCoreServer`]: HTTP core endpoint backed by a `FakeCore`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keystack_test::{FakeCore, MockCoreServer};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_resolve() {
//!     let core = Arc::new(FakeCore::new().with_secret("op://vault/item/field", "value"));
//!     let server = MockCoreServer::start(core.clone()).await.unwrap();
//!
//!     println!("Core endpoint: {}", server.url());
//!     assert_eq!(core.init_calls(), 0);
//! }
//! ```

pub mod fake;
pub mod server;

pub use fake::FakeCore;
pub use server::MockCoreServer;
