//! End-to-end relay and requester scenarios that succeed.

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use cotacao_relay::{RelayServer, Requester, Store};

mod common;

#[tokio::test]
async fn test_relay_returns_and_persists_bid() {
    let (provider, calls) = common::start_provider("5.43", Duration::ZERO).await;
    let store = Store::open_in_memory().unwrap();
    let (relay, shutdown) = common::start_relay(common::relay_config(provider), store.clone()).await;

    let res = common::client()
        .get(common::endpoint(relay))
        .send()
        .await
        .expect("Relay unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "bid": "5.43" }));

    let rows = store.records().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, "5.43");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_requester_writes_output_file() {
    let (provider, _) = common::start_provider("5.43", Duration::ZERO).await;
    let store = Store::open_in_memory().unwrap();
    let (relay, shutdown) = common::start_relay(common::relay_config(provider), store.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cotacao.txt");
    let mut config = common::relay_config(provider);
    config.client.server_url = common::endpoint(relay);
    config.client.output_path = output.to_string_lossy().into_owned();

    let bid = Requester::new(&config).unwrap().fetch_and_store().await.unwrap();

    assert_eq!(bid, "5.43");
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "Dólar: 5.43\n");
    assert_eq!(store.records().await.unwrap().len(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_runs_append_one_row_each() {
    let (provider, _) = common::start_provider("5.43", Duration::ZERO).await;
    let store = Store::open_in_memory().unwrap();
    let (relay, shutdown) = common::start_relay(common::relay_config(provider), store.clone()).await;

    let client = common::client();
    for _ in 0..3 {
        let res = client.get(common::endpoint(relay)).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }

    let rows = store.records().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    assert!(rows.iter().all(|r| r.value == "5.43"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_requests_each_persist() {
    let (provider, _) = common::start_provider("5.43", Duration::from_millis(50)).await;
    let store = Store::open_in_memory().unwrap();
    let (relay, shutdown) = common::start_relay(common::relay_config(provider), store.clone()).await;

    let client = common::client();
    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        let url = common::endpoint(relay);
        handles.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    assert_eq!(store.records().await.unwrap().len(), 8);

    shutdown.trigger();
}

#[tokio::test]
async fn test_only_get_cotacao_is_routed() {
    let (provider, calls) = common::start_provider("5.43", Duration::ZERO).await;
    let server = RelayServer::new(common::relay_config(provider), Store::open_in_memory().unwrap()).unwrap();

    let res = server
        .router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .router()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/cotacao")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
