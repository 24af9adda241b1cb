#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};

use sql_gateway::prelude::*;

/// A gateway bound to an ephemeral port plus an HTTP client to talk to it.
pub struct TestGateway {
    handle: GatewayHandle,
    client: reqwest::Client,
}

impl TestGateway {
    /// Launch on 127.0.0.1 with an OS-assigned port.
    pub async fn launch(mut config: GatewayConfig) -> Self {
        config.bind_host = "127.0.0.1".into();
        config.port = 0;
        let handle = launch(config).await.expect("gateway should start");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("client should build");
        Self { handle, client }
    }

    /// Launch with a single database descriptor.
    pub async fn launch_db(descriptor: DbDescriptor) -> Self {
        Self::launch(GatewayConfig {
            databases: vec![descriptor],
            ..GatewayConfig::default()
        })
        .await
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "http://{}/{}",
            self.handle.local_addr(),
            path.trim_start_matches('/')
        )
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST a transaction request; returns (status, parsed body).
    pub async fn call(&self, db: &str, body: Value) -> (u16, Value) {
        self.call_with_auth(db, body, None).await
    }

    pub async fn call_with_auth(
        &self,
        db: &str,
        body: Value,
        basic: Option<(&str, &str)>,
    ) -> (u16, Value) {
        let mut request = self.client.post(self.url(db)).json(&body);
        if let Some((user, password)) = basic {
            request = request.basic_auth(user, Some(password));
        }
        let response = request.send().await.expect("request should complete");
        let status = response.status().as_u16();
        let text = response.text().await.expect("body should read");
        let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        (status, value)
    }

    /// POST a raw (possibly malformed) body.
    pub async fn call_raw(&self, db: &str, body: &str) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(db))
            .header("Content-Type", "application/json")
            .body(body.to_owned())
            .send()
            .await
            .expect("request should complete");
        let status = response.status().as_u16();
        let text = response.text().await.expect("body should read");
        let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        (status, value)
    }

    pub async fn get(&self, path: &str) -> (u16, String) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request should complete");
        (
            response.status().as_u16(),
            response.text().await.expect("body should read"),
        )
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().await;
    }
}

pub fn tx(items: Vec<Value>) -> Value {
    json!({ "transaction": items })
}

pub fn statement(sql: &str) -> Value {
    json!({ "statement": sql })
}

pub fn statement_no_fail(sql: &str) -> Value {
    json!({ "statement": sql, "noFail": true })
}

pub fn query(sql: &str) -> Value {
    json!({ "query": sql })
}

/// Shorthand for the result array of a 200 response.
pub fn results(body: &Value) -> &Vec<Value> {
    body["results"].as_array().expect("results should be present")
}
