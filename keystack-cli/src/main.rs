//! keystack - resolve secret references from the command line
//!
//! Creates one client on the shared core engine, resolves every reference
//! given on the command line, and prints the values to stdout.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use keystack::{options, Client, Context, SecretsApi, DEFAULT_INTEGRATION_NAME, DEFAULT_INTEGRATION_VERSION};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "keystack")]
#[command(about = "Resolve secrets through the keystack core engine", long_about = None)]
struct Args {
    /// Service account token
    #[arg(long, env = "KEYSTACK_SERVICE_ACCOUNT_TOKEN", hide_env_values = true)]
    token: String,

    /// Integration name reported to the core engine
    #[arg(long, default_value = DEFAULT_INTEGRATION_NAME, env = "KEYSTACK_INTEGRATION_NAME")]
    integration_name: String,

    /// Integration version reported to the core engine
    #[arg(long, default_value = DEFAULT_INTEGRATION_VERSION, env = "KEYSTACK_INTEGRATION_VERSION")]
    integration_version: String,

    /// Overall deadline in seconds for creating the client and resolving every reference
    #[arg(long, env = "KEYSTACK_TIMEOUT")]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "KEYSTACK_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve secret references (op://<vault>/<item>[/<section>]/<field>)
    Resolve {
        /// Secret references to resolve
        #[arg(required = true)]
        references: Vec<String>,

        /// Print a JSON object keyed by reference
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries secret values only.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("keystack={0},keystack_core={0}", args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = match args.timeout {
        Some(secs) => Context::with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    };

    let client = Client::new(
        &ctx,
        [
            options::with_service_account_token(args.token),
            options::with_integration_info(args.integration_name, args.integration_version),
        ],
    )
    .await
    .context("failed to create client")?;

    let result = match args.command {
        Command::Resolve { references, json } => resolve(&ctx, &client, &references, json).await,
    };

    // Outside the deadline: the release must reach the engine before exit.
    if let Err(e) = client.shutdown(&Context::background()).await {
        warn!(error = %e, "failed to release client");
    }
    result
}

async fn resolve(
    ctx: &Context,
    client: &Client,
    references: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let secrets = client.secrets();
    let mut values = Vec::with_capacity(references.len());

    for reference in references {
        let value = secrets
            .resolve(ctx, reference)
            .await
            .with_context(|| format!("failed to resolve {reference}"))?;
        values.push(value);
    }

    info!(count = values.len(), "resolved secret references");

    if json {
        let object: serde_json::Map<String, serde_json::Value> = references
            .iter()
            .cloned()
            .zip(values.into_iter().map(serde_json::Value::String))
            .collect();
        println!("{}", serde_json::to_string_pretty(&object)?);
    } else {
        for value in values {
            println!("{value}");
        }
    }

    Ok(())
}
