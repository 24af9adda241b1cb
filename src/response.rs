use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// The per-item outcome. Exactly one of the three result fields is present
/// on success; all are omitted on failure, and `error` is non-empty iff
/// `success` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseItem {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_set: Option<Vec<Map<String, JsonValue>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_updated: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_updated_batch: Option<Vec<usize>>,
    #[serde(default)]
    pub error: String,
}

impl ResponseItem {
    #[must_use]
    pub fn query_ok(rows: Vec<Map<String, JsonValue>>) -> Self {
        Self {
            success: true,
            result_set: Some(rows),
            rows_updated: None,
            rows_updated_batch: None,
            error: String::new(),
        }
    }

    #[must_use]
    pub fn statement_ok(rows_updated: usize) -> Self {
        Self {
            success: true,
            result_set: None,
            rows_updated: Some(rows_updated),
            rows_updated_batch: None,
            error: String::new(),
        }
    }

    #[must_use]
    pub fn batch_ok(counts: Vec<usize>) -> Self {
        Self {
            success: true,
            result_set: None,
            rows_updated: None,
            rows_updated_batch: Some(counts),
            error: String::new(),
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result_set: None,
            rows_updated: None,
            rows_updated_batch: None,
            error: error.into(),
        }
    }
}

/// Successful envelope: one response item per request item, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub results: Vec<ResponseItem>,
}

/// Error envelope for aborted or rejected requests; no results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
