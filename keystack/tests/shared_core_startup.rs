//! Lazy construction of the process-wide shared core engine
//!
//! The engine endpoint comes from `KEYSTACK_CORE_ENDPOINT`, so this runs as
//! a single test in its own binary.

use futures::future::join_all;
use keystack::{options, Client, Context, CoreError, Error, SecretsApi};
use keystack_core::shared_core;
use keystack_test::{FakeCore, MockCoreServer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

fn point_core_at(endpoint: &str) {
    std::env::set_var("KEYSTACK_CORE_ENDPOINT", endpoint);
}

#[tokio::test]
async fn test_shared_core_startup() {
    std::env::set_var("KEYSTACK_CORE_REQUEST_TIMEOUT_SECS", "5");

    // An endpoint that accepts connections but never answers.
    let stalled = TcpListener::bind("127.0.0.1:0").await.unwrap();
    point_core_at(&format!("http://{}", stalled.local_addr().unwrap()));
    let holder = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = stalled.accept().await {
            held.push(socket);
        }
    });

    let started = Instant::now();
    let result = Client::new(
        &Context::with_timeout(Duration::from_millis(200)),
        [options::with_service_account_token("ops_startup")],
    )
    .await;
    assert!(
        matches!(result, Err(Error::EngineInitialization(CoreError::DeadlineExceeded))),
        "{result:?}"
    );
    assert!(started.elapsed() < Duration::from_secs(2));
    holder.abort();

    // Nothing listening at all.
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    point_core_at(&format!("http://{}", closed.local_addr().unwrap()));
    drop(closed);

    let result = Client::new(
        &Context::background(),
        [options::with_service_account_token("ops_startup")],
    )
    .await;
    assert!(
        matches!(result, Err(Error::EngineInitialization(CoreError::Unavailable(_)))),
        "{result:?}"
    );

    // Failed attempts are not cached: the next caller builds the engine.
    let core = Arc::new(FakeCore::new().with_secret("op://vault/db/password", "hunter2"));
    let server = MockCoreServer::start(core.clone()).await.unwrap();
    point_core_at(server.url());

    let ctx = Context::background();
    let clients = join_all((0..8).map(|i| {
        Client::new(
            &ctx,
            [options::with_service_account_token(format!("ops_startup_{i}"))],
        )
    }))
    .await;
    let clients: Vec<Client> = clients.into_iter().map(Result::unwrap).collect();

    assert_eq!(server.health_checks(), 1);
    assert_eq!(core.init_calls(), 8);

    let engines = join_all((0..4).map(|_| shared_core())).await;
    let first = shared_core().await.unwrap();
    for engine in engines {
        assert!(Arc::ptr_eq(&engine.unwrap(), &first));
    }

    let value = clients[3]
        .secrets()
        .resolve(&ctx, "op://vault/db/password")
        .await
        .unwrap();
    assert_eq!(value, "hunter2");

    for client in &clients {
        client.shutdown(&ctx).await.unwrap();
    }
    assert_eq!(core.live_clients(), 0);
    assert_eq!(server.health_checks(), 1);
}
