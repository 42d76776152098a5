//! Client creation and release against a fake core engine

use keystack::{options, Client, ClientOption, ConfigError, Context, Error, ErrorCode, SecretsApi};
use keystack_test::FakeCore;
use std::sync::Arc;
use std::time::Duration;

fn token() -> ClientOption {
    options::with_service_account_token("ops_test_token")
}

async fn create_client(core: &Arc<FakeCore>) -> Client {
    Client::with_core(&Context::background(), core.clone(), [token()])
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_client_forwards_config() {
    let core = Arc::new(FakeCore::new());

    let client = Client::with_core(
        &Context::background(),
        core.clone(),
        [token(), options::with_integration_info("lifecycle-tests", "0.9.0")],
    )
    .await
    .unwrap();

    let config = core.client_config(client.id()).unwrap();
    assert_eq!(config.token, "ops_test_token");
    assert_eq!(config.integration_name, "lifecycle-tests");
    assert_eq!(config.integration_version, "0.9.0");
    assert_eq!(core.init_calls(), 1);
    assert!(!client.is_closed());
}

#[tokio::test]
async fn test_failing_option_never_reaches_engine() {
    let core = Arc::new(FakeCore::new());

    let result = Client::with_core(
        &Context::background(),
        core.clone(),
        [
            token(),
            options::with_token_from_env("KEYSTACK_TEST_UNSET_TOKEN_VARIABLE"),
        ],
    )
    .await;

    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigError::MissingEnvironment(_)))
    ));
    assert_eq!(core.init_calls(), 0);
    assert_eq!(core.live_clients(), 0);
}

#[tokio::test]
async fn test_engine_rejection_is_client_initialization_error() {
    let core = Arc::new(FakeCore::new().failing_init(ErrorCode::InvalidToken, "token expired"));

    let result = Client::with_core(&Context::background(), core.clone(), [token()]).await;

    match result {
        Err(Error::ClientInitialization(source)) => {
            assert_eq!(source.code(), Some(ErrorCode::InvalidToken));
            assert!(source.to_string().contains("token expired"));
        }
        other => panic!("expected client initialization error, got {other:?}"),
    }
    assert_eq!(core.init_calls(), 1);
    assert_eq!(core.live_clients(), 0);
}

#[tokio::test]
async fn test_empty_token_is_validated_by_engine() {
    let core = Arc::new(FakeCore::new());

    let result = Client::with_core(&Context::background(), core.clone(), Vec::new()).await;

    assert!(matches!(result, Err(Error::ClientInitialization(_))));
    assert_eq!(core.init_calls(), 1);
}

#[tokio::test]
async fn test_close_releases_once() {
    let core = Arc::new(FakeCore::new());
    let client = create_client(&core).await;
    let id = client.id();

    client.close();
    client.close();
    assert!(client.is_closed());
    assert_eq!(core.released(), vec![id]);

    drop(client);
    assert_eq!(core.released(), vec![id]);
}

#[tokio::test]
async fn test_shutdown_releases_once() {
    let core = Arc::new(FakeCore::new());
    let client = create_client(&core).await;
    let id = client.id();

    client.shutdown(&Context::background()).await.unwrap();
    assert!(client.is_closed());
    assert_eq!(core.released(), vec![id]);

    client.shutdown(&Context::background()).await.unwrap();
    client.close();
    drop(client);
    assert_eq!(core.released(), vec![id]);
}

#[tokio::test]
async fn test_shutdown_defers_to_in_flight_invocations() {
    let core = Arc::new(FakeCore::new().echo().with_latency(Duration::from_millis(100)));
    let client = create_client(&core).await;
    let id = client.id();

    let in_flight = tokio::spawn({
        let client = client.clone();
        async move { client.invoke(&Context::background(), "Slow", &["payload"]).await }
    });

    while core.invocations().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    client.shutdown(&Context::background()).await.unwrap();
    assert!(core.released().is_empty());

    assert!(in_flight.await.unwrap().is_ok());
    assert_eq!(core.released(), vec![id]);
}

#[tokio::test]
async fn test_drop_of_last_clone_releases() {
    let core = Arc::new(FakeCore::new());
    let client = create_client(&core).await;
    let id = client.id();
    let clone = client.clone();

    drop(client);
    assert!(core.released().is_empty());

    drop(clone);
    assert_eq!(core.released(), vec![id]);
    assert_eq!(core.live_clients(), 0);
}

#[tokio::test]
async fn test_secrets_facade_keeps_client_alive() {
    let core = Arc::new(FakeCore::new().with_secret("op://vault/db/password", "s3cret"));
    let client = create_client(&core).await;
    let id = client.id();
    let secrets = client.secrets();

    drop(client);
    assert!(core.released().is_empty());

    let value = secrets
        .resolve(&Context::background(), "op://vault/db/password")
        .await
        .unwrap();
    assert_eq!(value, "s3cret");

    drop(secrets);
    assert_eq!(core.released(), vec![id]);
}

#[tokio::test]
async fn test_invoke_after_close_fails_fast() {
    let core = Arc::new(FakeCore::new().echo());
    let client = create_client(&core).await;

    client
        .invoke(&Context::background(), "Ping", &["before"])
        .await
        .unwrap();
    client.close();

    let result = client
        .invoke(&Context::background(), "Ping", &["after"])
        .await;
    assert!(matches!(result, Err(Error::ClientReleased)));

    let result = client
        .secrets()
        .resolve(&Context::background(), "op://vault/item/field")
        .await;
    assert!(matches!(result, Err(Error::ClientReleased)));

    assert_eq!(core.invocations().len(), 1);
}

#[tokio::test]
async fn test_close_waits_for_in_flight_invocations() {
    let core = Arc::new(FakeCore::new().echo().with_latency(Duration::from_millis(200)));
    let client = create_client(&core).await;
    let id = client.id();

    let in_flight = tokio::spawn({
        let client = client.clone();
        async move {
            client
                .invoke(&Context::background(), "Slow", &["payload"])
                .await
        }
    });

    while core.invocations().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    client.close();
    assert!(client.is_closed());
    assert!(core.released().is_empty());

    let rejected = client.invoke(&Context::background(), "Slow", &["late"]).await;
    assert!(matches!(rejected, Err(Error::ClientReleased)));

    let result = in_flight.await.unwrap();
    assert!(result.is_ok());
    assert_eq!(core.released(), vec![id]);
}

#[tokio::test]
async fn test_failed_invocation_leaves_client_usable() {
    let core = Arc::new(FakeCore::new().with_secret("op://vault/api/key", "abc123"));
    let client = create_client(&core).await;
    let ctx = Context::background();

    let missing = client.secrets().resolve(&ctx, "op://vault/api/missing").await;
    match missing {
        Err(Error::Invocation { method, source }) => {
            assert_eq!(method, "Resolve");
            assert_eq!(source.code(), Some(ErrorCode::NotFound));
        }
        other => panic!("expected invocation error, got {other:?}"),
    }

    let value = client.secrets().resolve(&ctx, "op://vault/api/key").await.unwrap();
    assert_eq!(value, "abc123");
    assert!(!client.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_stops_waiting_on_engine() {
    let core = Arc::new(FakeCore::new().echo().with_latency(Duration::from_secs(10)));
    let client = create_client(&core).await;

    let ctx = Context::with_timeout(Duration::from_millis(100));
    let result = client.invoke(&ctx, "Slow", &["x"]).await;

    match result {
        Err(Error::Invocation { source, .. }) => {
            assert!(matches!(source, keystack::CoreError::DeadlineExceeded));
        }
        other => panic!("expected deadline error, got {other:?}"),
    }

    // The abandoned call no longer holds the client.
    client.close();
    assert_eq!(core.released(), vec![client.id()]);
}

#[tokio::test]
async fn test_clients_get_distinct_ids() {
    let core = Arc::new(FakeCore::new());
    let first = create_client(&core).await;
    let second = create_client(&core).await;

    assert_ne!(first.id(), second.id());
    assert_eq!(core.live_clients(), 2);

    first.close();
    assert_eq!(core.live_clients(), 1);
    assert!(!second.is_closed());
}
