use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// One transaction batch as posted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction: Vec<RequestItem>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// A single query or statement within a transaction batch.
///
/// Exactly one of `query` and `statement` must be set; the executor rejects
/// anything else per item so `noFail` can downgrade the violation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub values: Option<Map<String, JsonValue>>,
    #[serde(default)]
    pub values_batch: Option<Vec<Map<String, JsonValue>>>,
    #[serde(default)]
    pub no_fail: bool,
}

/// Inline credential carrier, the body-level equivalent of HTTP Basic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user: String,
    pub password: String,
}
