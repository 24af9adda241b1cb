use std::collections::HashMap;

use deadpool_sqlite::rusqlite::Statement;
use serde_json::{Map, Value as JsonValue};

use crate::error::GatewayDbError;
use crate::types::RowValues;

/// Named parameter values for one binding of a statement.
pub type NamedParams = HashMap<String, RowValues>;

/// Convert a JSON `values` mapping into bindable values.
///
/// # Errors
///
/// Returns `GatewayDbError::ParameterError` if any value is a JSON array or
/// object.
pub fn convert_named_params(values: &Map<String, JsonValue>) -> Result<NamedParams, GatewayDbError> {
    let mut params = NamedParams::with_capacity(values.len());
    for (name, value) in values {
        params.insert(name.clone(), RowValues::from_json(value)?);
    }
    Ok(params)
}

/// Bind named parameters onto a prepared statement by raw index.
///
/// SQLite reports each parameter slot's name (`:name`, `@name` or `$name`);
/// the sigil is stripped before lookup. Slots whose name is missing from
/// the mapping are left unbound, which SQLite treats as NULL. Extra names
/// in the mapping are ignored.
///
/// # Errors
///
/// Returns `GatewayDbError` if the engine rejects a binding.
pub fn bind_named(stmt: &mut Statement, params: &NamedParams) -> Result<(), GatewayDbError> {
    let count = stmt.parameter_count();
    let mut bindings = Vec::with_capacity(count);
    for idx in 1..=count {
        if let Some(name) = stmt.parameter_name(idx) {
            let key = name.trim_start_matches([':', '@', '$']);
            if let Some(value) = params.get(key) {
                bindings.push((idx, value.to_sqlite()));
            }
        }
    }
    for (idx, value) in bindings {
        stmt.raw_bind_parameter(idx, value)?;
    }
    Ok(())
}
