//! Client configuration options
//!
//! Options are applied in order on top of [`ClientConfig::default`]. Later
//! options override earlier ones; the first failing option aborts the build.
//! Values are not validated here: the core engine checks them when the
//! client is initialized.

use keystack_core::ClientConfig;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::ConfigError;

type ApplyFn = dyn FnOnce(&mut ClientConfig) -> Result<(), ConfigError> + Send;

/// One configuration change
pub struct ClientOption(Box<ApplyFn>);

impl ClientOption {
    pub fn new<F>(apply: F) -> Self
    where
        F: FnOnce(&mut ClientConfig) -> Result<(), ConfigError> + Send + 'static,
    {
        Self(Box::new(apply))
    }

    fn apply(self, config: &mut ClientConfig) -> Result<(), ConfigError> {
        (self.0)(config)
    }
}

impl std::fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientOption")
    }
}

/// Build a configuration from `options`, applied in order
pub fn build_config(
    options: impl IntoIterator<Item = ClientOption>,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();
    for option in options {
        option.apply(&mut config)?;
    }
    Ok(config)
}

/// Authenticate with a service account token
pub fn with_service_account_token(token: impl Into<String>) -> ClientOption {
    let token = token.into();
    ClientOption::new(move |config| {
        config.token = token;
        Ok(())
    })
}

/// Name and version of the integration using the SDK
///
/// Use [`DEFAULT_INTEGRATION_NAME`](keystack_core::DEFAULT_INTEGRATION_NAME)
/// and [`DEFAULT_INTEGRATION_VERSION`](keystack_core::DEFAULT_INTEGRATION_VERSION)
/// when unsure.
pub fn with_integration_info(name: impl Into<String>, version: impl Into<String>) -> ClientOption {
    let name = name.into();
    let version = version.into();
    ClientOption::new(move |config| {
        config.integration_name = name;
        config.integration_version = version;
        Ok(())
    })
}

/// Read the service account token from the environment variable `var`
pub fn with_token_from_env(var: impl Into<String>) -> ClientOption {
    let var = var.into();
    ClientOption::new(move |config| {
        config.token = std::env::var(&var).map_err(|e| match e {
            std::env::VarError::NotPresent => ConfigError::MissingEnvironment(var.clone()),
            std::env::VarError::NotUnicode(_) => ConfigError::Invalid {
                option: var.clone(),
                reason: "value is not valid unicode".to_string(),
            },
        })?;
        Ok(())
    })
}

/// Client settings read from `KEYSTACK_*` environment variables
#[derive(Debug, Default, Deserialize)]
struct EnvironmentSettings {
    service_account_token: Option<String>,
    integration_name: Option<String>,
    integration_version: Option<String>,
}

/// Apply `KEYSTACK_SERVICE_ACCOUNT_TOKEN`, `KEYSTACK_INTEGRATION_NAME` and
/// `KEYSTACK_INTEGRATION_VERSION` when they are set
pub fn from_environment() -> ClientOption {
    from_environment_source(None)
}

fn from_environment_source(source: Option<HashMap<String, String>>) -> ClientOption {
    ClientOption::new(move |target| {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("KEYSTACK").source(source))
            .build()?
            .try_deserialize::<EnvironmentSettings>()?;

        if let Some(token) = settings.service_account_token {
            target.token = token;
        }
        if let Some(name) = settings.integration_name {
            target.integration_name = name;
        }
        if let Some(version) = settings.integration_version {
            target.integration_version = version;
        }
        Ok(())
    })
}
