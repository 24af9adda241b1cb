mod helpers;

use helpers::{query, results, statement, tx, TestGateway};
use serde_json::json;
use sql_gateway::prelude::*;

fn guarded_db(mode: AuthMode) -> DbDescriptor {
    DbDescriptor::new("test", ":memory:")
        .init_statement("CREATE TABLE T1 (ID INT PRIMARY KEY)")
        .auth(AuthConfig {
            mode,
            by_credentials: vec![CredentialEntry {
                user: "myUser".into(),
                password: "myPassword".into(),
            }],
        })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn basic_auth_guards_the_database() {
    let gw = TestGateway::launch_db(guarded_db(AuthMode::HttpBasic)).await;

    let insert = tx(vec![statement("INSERT INTO T1 VALUES (1)")]);

    let (code, _) = gw.call("test", insert.clone()).await;
    assert_eq!(code, 401);

    let (code, _) = gw
        .call_with_auth("test", insert.clone(), Some(("myUser", "wrong")))
        .await;
    assert_eq!(code, 401);

    let (code, body) = gw
        .call_with_auth("test", insert, Some(("myUser", "myPassword")))
        .await;
    assert_eq!(code, 200);
    assert_eq!(results(&body)[0]["success"], json!(true));

    // the rejected requests must not have written anything
    let (code, body) = gw
        .call_with_auth(
            "test",
            tx(vec![query("SELECT COUNT(*) AS N FROM T1")]),
            Some(("myUser", "myPassword")),
        )
        .await;
    assert_eq!(code, 200);
    assert_eq!(results(&body)[0]["resultSet"][0]["N"], json!(1));

    gw.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn inline_credentials_travel_in_the_body() {
    let gw = TestGateway::launch_db(guarded_db(AuthMode::Inline)).await;

    let (code, _) = gw
        .call("test", tx(vec![query("SELECT 1 AS ONE")]))
        .await;
    assert_eq!(code, 401);

    let (code, body) = gw
        .call(
            "test",
            json!({
                "transaction": [ { "query": "SELECT 1 AS ONE" } ],
                "credentials": { "user": "myUser", "password": "myPassword" }
            }),
        )
        .await;
    assert_eq!(code, 200);
    assert_eq!(results(&body)[0]["resultSet"][0]["ONE"], json!(1));

    gw.shutdown().await;
}
