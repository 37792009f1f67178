//! Routing table hot reload through the filesystem watcher.

use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::StatusCode;

mod common;

const V1: &str = r#"{"example.com":{"/old":{"persistent":true,"url":"https://example.com/new"},
                     "default":{"persistent":false,"url":"https://example.com"}}}"#;
const V2: &str = r#"{"example.com":{"/old":{"persistent":false,"url":"https://example.org/moved"}},
                     "added.com":{"default":{"persistent":true,"url":"https://added.com/home"}}}"#;

async fn status_and_location(gateway: &common::TestGateway, host: &str, path: &str) -> (StatusCode, Option<String>) {
    let res = common::client()
        .get(gateway.url(path))
        .header("Host", host)
        .send()
        .await
        .unwrap();
    let location = res
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (res.status(), location)
}

#[tokio::test]
async fn valid_edit_is_applied() {
    let gateway = common::start_gateway(V1, true).await;
    // Let the watcher settle before editing.
    tokio::time::sleep(Duration::from_millis(200)).await;

    gateway.write_routes(V2);
    let store = gateway.store.clone();
    let applied = common::eventually(Duration::from_secs(10), || {
        let store = store.clone();
        async move { store.current().version() > 1 }
    })
    .await;
    assert!(applied, "routing file change was never applied");

    assert_eq!(
        status_and_location(&gateway, "example.com", "/old").await,
        (StatusCode::FOUND, Some("https://example.org/moved".to_string()))
    );
    assert_eq!(
        status_and_location(&gateway, "added.com", "/anything").await,
        (StatusCode::MOVED_PERMANENTLY, Some("https://added.com/home".to_string()))
    );
    // The default rule went away with the old table.
    assert_eq!(status_and_location(&gateway, "example.com", "/missing").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn corrupt_edit_keeps_serving_old_table() {
    let gateway = common::start_gateway(V1, true).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    gateway.write_routes(&V2[..V2.len() / 2]);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(gateway.store.current().version(), 1);
    assert_eq!(
        status_and_location(&gateway, "example.com", "/old").await,
        (StatusCode::MOVED_PERMANENTLY, Some("https://example.com/new".to_string()))
    );
}

#[tokio::test]
async fn deleted_file_keeps_serving_and_recreation_is_picked_up() {
    let gateway = common::start_gateway(V1, true).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    std::fs::remove_file(&gateway.routes_path).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(gateway.store.current().version(), 1);
    assert_eq!(status_and_location(&gateway, "example.com", "/old").await.0, StatusCode::MOVED_PERMANENTLY);

    gateway.write_routes(V2);
    let store = gateway.store.clone();
    let applied = common::eventually(Duration::from_secs(10), || {
        let store = store.clone();
        async move { store.current().version() > 1 }
    })
    .await;
    assert!(applied, "re-created routing file was never applied");
    assert_eq!(status_and_location(&gateway, "added.com", "/").await.0, StatusCode::MOVED_PERMANENTLY);
}

#[tokio::test]
async fn watching_disabled_ignores_edits() {
    let gateway = common::start_gateway(V1, false).await;

    gateway.write_routes(V2);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(gateway.store.current().version(), 1);
}
