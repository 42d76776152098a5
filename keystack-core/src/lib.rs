//! Core engine boundary for keystack
//!
//! This crate defines everything that crosses into the shared core engine:
//! - The [`Core`] call contract (init, invoke, release)
//! - Boundary payloads ([`ClientConfig`], [`InvokeConfig`])
//! - The HTTP transport to an out-of-process engine ([`HttpCore`])
//! - The process-wide shared engine ([`shared_core`])

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod http;
pub mod request_id;
pub mod settings;
pub mod shared;

pub use config::{ClientConfig, DEFAULT_INTEGRATION_NAME, DEFAULT_INTEGRATION_VERSION};
pub use context::Context;
pub use engine::{Core, Invocation, InvokeConfig};
pub use error::{CoreError, ErrorCode};
pub use http::HttpCore;
pub use request_id::RequestId;
pub use settings::CoreSettings;
pub use shared::{install_shared_core, shared_core};
