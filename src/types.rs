use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use deadpool_sqlite::rusqlite;
use serde_json::Value as JsonValue;

use crate::error::GatewayDbError;

/// Values that can travel between the JSON wire surface and an SQLite row
/// or bind parameter.
///
/// The JSON side only produces scalars; `Blob` exists so result extraction
/// can represent BLOB columns (encoded as base64 text on the way out).
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// NULL value
    Null,
    /// Boolean value (bound as integer 0/1)
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Convert a JSON value into a bindable value.
    ///
    /// # Errors
    ///
    /// Returns `GatewayDbError::ParameterError` for JSON arrays and objects;
    /// only scalars and null are bindable.
    pub fn from_json(value: &JsonValue) -> Result<Self, GatewayDbError> {
        match value {
            JsonValue::Null => Ok(RowValues::Null),
            JsonValue::Bool(b) => Ok(RowValues::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(RowValues::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(RowValues::Float(f))
                } else {
                    Err(GatewayDbError::ParameterError(format!(
                        "unsupported numeric parameter: {n}"
                    )))
                }
            }
            JsonValue::String(s) => Ok(RowValues::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => Err(GatewayDbError::ParameterError(
                "parameter values must be JSON scalars or null".into(),
            )),
        }
    }

    /// Convert to the engine's native value for binding.
    #[must_use]
    pub fn to_sqlite(&self) -> rusqlite::types::Value {
        match self {
            RowValues::Null => rusqlite::types::Value::Null,
            RowValues::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
            RowValues::Int(i) => rusqlite::types::Value::Integer(*i),
            RowValues::Float(f) => rusqlite::types::Value::Real(*f),
            RowValues::Text(s) => rusqlite::types::Value::Text(s.clone()),
            RowValues::Blob(bytes) => rusqlite::types::Value::Blob(bytes.clone()),
        }
    }

    /// Extract a value from an SQLite column reference.
    ///
    /// Text is decoded strictly; SQLite stores TEXT as UTF-8, so any valid
    /// Unicode round-trips byte-for-byte.
    ///
    /// # Errors
    ///
    /// Returns `GatewayDbError::ExecutionError` if a TEXT column holds
    /// invalid UTF-8.
    pub fn from_sqlite(value: rusqlite::types::ValueRef<'_>) -> Result<Self, GatewayDbError> {
        match value {
            rusqlite::types::ValueRef::Null => Ok(RowValues::Null),
            rusqlite::types::ValueRef::Integer(i) => Ok(RowValues::Int(i)),
            rusqlite::types::ValueRef::Real(f) => Ok(RowValues::Float(f)),
            rusqlite::types::ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| RowValues::Text(s.to_owned()))
                .map_err(|e| {
                    GatewayDbError::ExecutionError(format!("invalid UTF-8 in text column: {e}"))
                }),
            rusqlite::types::ValueRef::Blob(b) => Ok(RowValues::Blob(b.to_vec())),
        }
    }

    /// Encode for the JSON response. Blobs become base64 text, matching how
    /// byte arrays are conventionally serialized over JSON.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Null => JsonValue::Null,
            RowValues::Bool(b) => JsonValue::Bool(*b),
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Blob(bytes) => JsonValue::String(BASE64.encode(bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(RowValues::from_json(&json!(null)).unwrap(), RowValues::Null);
        assert_eq!(
            RowValues::from_json(&json!(true)).unwrap(),
            RowValues::Bool(true)
        );
        assert_eq!(RowValues::from_json(&json!(7)).unwrap(), RowValues::Int(7));
        assert_eq!(
            RowValues::from_json(&json!(1.5)).unwrap(),
            RowValues::Float(1.5)
        );
        assert_eq!(
            RowValues::from_json(&json!("hi")).unwrap(),
            RowValues::Text("hi".into())
        );
    }

    #[test]
    fn json_composites_rejected() {
        assert!(RowValues::from_json(&json!([1, 2])).is_err());
        assert!(RowValues::from_json(&json!({"a": 1})).is_err());
    }

    #[test]
    fn unicode_survives_round_trip() {
        let text = "世界 — ужин — ✓";
        let v = RowValues::from_json(&json!(text)).unwrap();
        assert_eq!(v.as_text(), Some(text));
        assert_eq!(v.to_json(), json!(text));
    }

    #[test]
    fn blob_encodes_base64() {
        let v = RowValues::Blob(b"Blob12".to_vec());
        assert_eq!(v.to_json(), json!("QmxvYjEy"));
    }
}
