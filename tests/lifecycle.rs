mod helpers;

use helpers::{query, results, statement, tx, TestGateway};
use serde_json::json;
use sql_gateway::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_database_is_created_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let gw = TestGateway::launch_db(DbDescriptor::new(
        "test",
        path.display().to_string(),
    ))
    .await;
    assert!(path.exists(), "db file should have been created");
    gw.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exotic_file_suffixes_work() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite3");

    let gw = TestGateway::launch_db(DbDescriptor::new(
        "test",
        path.display().to_string(),
    ))
    .await;
    assert!(path.exists());

    let (code, _) = gw
        .call(
            "test",
            tx(vec![statement(
                "CREATE TABLE T1 (ID INT PRIMARY KEY, VAL TEXT NOT NULL)",
            )]),
        )
        .await;
    assert_eq!(code, 200);

    gw.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_database_ids_fail_startup() {
    let config = GatewayConfig {
        databases: vec![
            DbDescriptor::new("test", ":memory:"),
            DbDescriptor::new("test", ":memory:"),
        ],
        ..GatewayConfig::default()
    };
    let err = sql_gateway::launch(config).await.unwrap_err();
    assert!(matches!(err, StartupError::DuplicateDatabaseId(id) if id == "test"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn read_only_with_init_statements_fails_startup() {
    let config = GatewayConfig {
        databases: vec![
            DbDescriptor::new("test", ":memory:")
                .read_only(true)
                .init_statement("CREATE TABLE T1 (ID INT)"),
        ],
        ..GatewayConfig::default()
    };
    let err = sql_gateway::launch(config).await.unwrap_err();
    assert!(matches!(err, StartupError::ReadOnlyInitStatements(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_init_statement_fails_startup_for_memory_db() {
    let config = GatewayConfig {
        databases: vec![
            DbDescriptor::new("test", ":memory:")
                .init_statement("CREATE TABLE T1 (ID INT)")
                .init_statement("CREATE TABLE T1 (ID INT)"),
        ],
        ..GatewayConfig::default()
    };
    let err = sql_gateway::launch(config).await.unwrap_err();
    assert!(matches!(err, StartupError::InitStatementFailed { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_init_deletes_the_new_file_and_sidecars() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    let config = GatewayConfig {
        databases: vec![
            DbDescriptor::new("test", path.display().to_string())
                .init_statement("CLEARLY INVALID SQL"),
        ],
        ..GatewayConfig::default()
    };
    let err = sql_gateway::launch(config).await.unwrap_err();
    assert!(matches!(err, StartupError::InitStatementFailed { .. }));

    for suffix in ["", "-shm", "-wal"] {
        let sidecar = dir.path().join(format!("test.db{suffix}"));
        assert!(!sidecar.exists(), "{} should be gone", sidecar.display());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn query_suffix_does_not_confuse_new_file_judgement() {
    let dir = tempfile::tempdir().unwrap();
    let path = format!("{}?cache=private", dir.path().join("test.db").display());

    // first launch creates the file and runs the init statement
    let gw = TestGateway::launch_db(
        DbDescriptor::new("test", path.clone()).init_statement("CREATE TABLE T1 (ID INT)"),
    )
    .await;
    gw.shutdown().await;

    // the second launch must see an existing file and skip the init
    // statement; re-running it would fail on the existing table
    let gw = TestGateway::launch_db(
        DbDescriptor::new("test", path).init_statement("CREATE TABLE T1 (ID INT)"),
    )
    .await;

    let (code, body) = gw
        .call("test", tx(vec![query("SELECT COUNT(*) AS N FROM T1")]))
        .await;
    assert_eq!(code, 200);
    assert_eq!(results(&body)[0]["resultSet"][0]["N"], json!(0));

    gw.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_database_reruns_init_statements_each_startup() {
    let descriptor = || {
        DbDescriptor::new("test", ":memory:")
            .init_statement("CREATE TABLE T1 (ID INT)")
            .init_statement("INSERT INTO T1 VALUES (1)")
    };

    for _ in 0..2 {
        let gw = TestGateway::launch_db(descriptor()).await;
        let (code, body) = gw
            .call("test", tx(vec![query("SELECT COUNT(*) AS N FROM T1")]))
            .await;
        assert_eq!(code, 200);
        // one row each time: a fresh store per startup
        assert_eq!(results(&body)[0]["resultSet"][0]["N"], json!(1));
        gw.shutdown().await;
    }
}
