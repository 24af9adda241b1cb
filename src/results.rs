use std::sync::Arc;

use deadpool_sqlite::rusqlite::Statement;
use serde_json::{Map, Value as JsonValue};

use crate::error::GatewayDbError;
use crate::types::RowValues;

/// A row from a query result, sharing its column names with the rest of the
/// result set.
#[derive(Debug, Clone)]
pub struct DbRow {
    pub column_names: Arc<Vec<String>>,
    pub values: Vec<RowValues>,
}

impl DbRow {
    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.column_names
            .iter()
            .position(|col| col == column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Encode the row as a JSON object keyed by column name. Duplicate
    /// column names collapse to the last occurrence, like any JSON map.
    #[must_use]
    pub fn to_json(&self) -> Map<String, JsonValue> {
        let mut map = Map::with_capacity(self.column_names.len());
        for (name, value) in self.column_names.iter().zip(&self.values) {
            map.insert(name.clone(), value.to_json());
        }
        map
    }
}

/// The ordered rows produced by one query.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub rows: Vec<DbRow>,
    column_names: Option<Arc<Vec<String>>>,
}

impl ResultSet {
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    #[must_use]
    pub fn to_json_rows(&self) -> Vec<Map<String, JsonValue>> {
        self.rows.iter().map(DbRow::to_json).collect()
    }
}

/// Build a result set by stepping an already-bound statement.
///
/// The statement is expected to have its parameters raw-bound beforehand
/// (see `params::bind_named`); stepping a non-SELECT statement this way
/// simply yields zero rows.
///
/// # Errors
///
/// Returns `GatewayDbError` if stepping the statement or extracting a
/// column value fails.
pub fn build_result_set(stmt: &mut Statement) -> Result<ResultSet, GatewayDbError> {
    let column_names: Arc<Vec<String>> =
        Arc::new(stmt.column_names().iter().map(|s| s.to_string()).collect());
    let col_count = column_names.len();

    let mut result_set = ResultSet {
        rows: Vec::new(),
        column_names: Some(Arc::clone(&column_names)),
    };

    let mut rows_iter = stmt.raw_query();
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(RowValues::from_sqlite(row.get_ref(i)?)?);
        }
        result_set.rows.push(DbRow {
            column_names: Arc::clone(&column_names),
            values,
        });
    }

    Ok(result_set)
}
