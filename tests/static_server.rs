mod helpers;

use helpers::{results, statement, tx, TestGateway};
use serde_json::json;
use sql_gateway::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn existing_files_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("mem1.yaml"), "databases: []\n").unwrap();

    let gw = TestGateway::launch(GatewayConfig {
        serve_dir: Some(dir.path().to_path_buf()),
        ..GatewayConfig::default()
    })
    .await;

    let (code, body) = gw.get("mem1.yaml").await;
    assert_eq!(code, 200);
    assert_eq!(body, "databases: []\n");

    gw.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn missing_files_are_404() {
    let dir = tempfile::tempdir().unwrap();

    let gw = TestGateway::launch(GatewayConfig {
        serve_dir: Some(dir.path().to_path_buf()),
        ..GatewayConfig::default()
    })
    .await;

    let (code, _) = gw.get("mem1_nonexistent.yaml").await;
    assert_eq!(code, 404);

    gw.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn database_route_and_static_file_namespaces_coexist() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("test1"), "static content").unwrap();

    let gw = TestGateway::launch(GatewayConfig {
        serve_dir: Some(dir.path().to_path_buf()),
        databases: vec![
            DbDescriptor::new("test1", ":memory:")
                .init_statement("CREATE TABLE T (NUM INT)"),
        ],
        ..GatewayConfig::default()
    })
    .await;

    // databases are POST-only, so the GET falls through to the file server
    let (code, body) = gw.get("test1").await;
    assert_eq!(code, 200);
    assert_eq!(body, "static content");

    // while POST still reaches the database
    let (code, body) = gw
        .call("test1", tx(vec![statement("INSERT INTO T VALUES (1)")]))
        .await;
    assert_eq!(code, 200);
    assert_eq!(results(&body)[0]["rowsUpdated"], json!(1));

    gw.shutdown().await;
}
