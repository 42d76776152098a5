//! The single call path from facades to the core engine

use keystack_core::{Context, Invocation, InvokeConfig};
use tracing::{debug, warn};

use crate::client::InnerClient;
use crate::error::{Error, Result};

/// Separator used to join invocation parameters
///
/// The join does not escape, so a call with more than one parameter may not
/// contain the separator in any of them. A single parameter is sent as is.
pub const PARAMETER_SEPARATOR: char = ',';

/// Join `params` into the engine's parameter string
fn encode_parameters<S: AsRef<str>>(method: &str, params: &[S]) -> Result<String> {
    if params.len() > 1 {
        if let Some(index) = params
            .iter()
            .position(|param| param.as_ref().contains(PARAMETER_SEPARATOR))
        {
            return Err(Error::InvalidParameters {
                method: method.to_string(),
                reason: format!("parameter {index} contains the separator '{PARAMETER_SEPARATOR}'"),
            });
        }
    }

    let mut encoded = String::new();
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            encoded.push(PARAMETER_SEPARATOR);
        }
        encoded.push_str(param.as_ref());
    }
    Ok(encoded)
}

pub(crate) async fn client_invoke<S: AsRef<str>>(
    ctx: &Context,
    client: &InnerClient,
    method: &str,
    params: &[S],
) -> Result<String> {
    let _lease = client.lease()?;

    let request = InvokeConfig {
        client_id: client.id(),
        invocation: Invocation {
            method_name: method.to_string(),
            parameters: encode_parameters(method, params)?,
        },
    };

    let request_id = ctx.request_id().cloned().unwrap_or_default();
    let ctx = ctx.clone().with_request_id(request_id.clone());
    debug!(client_id = client.id(), method = %method, request_id = %request_id, "invoking core method");

    ctx.run(client.core().invoke(&ctx, &request))
        .await
        .map_err(|source| {
            warn!(client_id = client.id(), method = %method, request_id = %request_id, error = %source, "core invocation failed");
            Error::Invocation {
                method: method.to_string(),
                source,
            }
        })
}
