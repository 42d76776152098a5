//! keystack secrets SDK
//!
//! A thin client over the shared core engine:
//! - [`Client`] creation from an ordered list of [`ClientOption`]s
//! - Generic invocation through [`Client::invoke`]
//! - Typed facades such as [`SecretsApi`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keystack::{options, Client, Context, SecretsApi};
//!
//! # async fn run() -> keystack::Result<()> {
//! let ctx = Context::background();
//! let client = Client::new(
//!     &ctx,
//!     [
//!         options::with_service_account_token("ops_..."),
//!         options::with_integration_info("my-app", "v1.0.0"),
//!     ],
//! )
//! .await?;
//!
//! let password = client.secrets().resolve(&ctx, "op://vault/item/password").await?;
//! # let _ = password;
//! client.close();
//! # Ok(())
//! # }
//! ```

mod client;
pub mod error;
mod invoke;
pub mod options;
mod secrets;

pub use client::Client;
pub use error::{ConfigError, Error, Result};
pub use invoke::PARAMETER_SEPARATOR;
pub use options::{build_config, ClientOption};
pub use secrets::{SecretsApi, SecretsSource};

pub use keystack_core::{
    ClientConfig, Context, Core, CoreError, ErrorCode, DEFAULT_INTEGRATION_NAME,
    DEFAULT_INTEGRATION_VERSION,
};
