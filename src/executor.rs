use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use deadpool_sqlite::rusqlite::{Batch, Connection, Transaction, TransactionBehavior};
use deadpool_sqlite::rusqlite::fallible_iterator::FallibleIterator;

use crate::db::Database;
use crate::error::GatewayDbError;
use crate::params::{self, NamedParams};
use crate::request::RequestItem;
use crate::response::ResponseItem;
use crate::stored::{self, ResolveError};

/// Writer contention is absorbed here rather than surfaced as SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The slice of database state a batch needs inside the blocking closure.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub read_only: bool,
    pub stored_only: bool,
    pub stored: Arc<HashMap<String, String>>,
}

/// How an aborted transaction maps onto the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortClass {
    /// Request-shape problem (400)
    BadRequest,
    /// Rejected transaction-control statement (409)
    Conflict,
    /// Engine failure (500)
    Engine,
}

/// A transaction that was rolled back instead of producing results.
#[derive(Debug)]
pub struct TxAbort {
    pub class: AbortClass,
    pub message: String,
}

/// Outcome of `execute_transaction`.
#[derive(Debug)]
pub enum ExecuteError {
    Abort(TxAbort),
    Db(GatewayDbError),
}

impl From<GatewayDbError> for ExecuteError {
    fn from(err: GatewayDbError) -> Self {
        ExecuteError::Db(err)
    }
}

/// A single item's failure, reported in-band when the item is `noFail`,
/// otherwise escalated to a `TxAbort`.
#[derive(Debug)]
enum ItemFailure {
    Shape(String),
    Resolve(ResolveError),
    TxControl(String),
    Engine(String),
}

impl ItemFailure {
    fn shape(msg: impl Into<String>) -> Self {
        ItemFailure::Shape(msg.into())
    }

    fn abort_class(&self) -> AbortClass {
        match self {
            ItemFailure::Shape(_) | ItemFailure::Resolve(_) => AbortClass::BadRequest,
            ItemFailure::TxControl(_) => AbortClass::Conflict,
            ItemFailure::Engine(_) => AbortClass::Engine,
        }
    }

    fn message(&self) -> String {
        match self {
            ItemFailure::Shape(msg) | ItemFailure::TxControl(msg) | ItemFailure::Engine(msg) => {
                msg.clone()
            }
            ItemFailure::Resolve(err) => err.to_string(),
        }
    }
}

impl From<GatewayDbError> for ItemFailure {
    fn from(err: GatewayDbError) -> Self {
        match err {
            GatewayDbError::ParameterError(msg) => ItemFailure::Shape(msg),
            other => ItemFailure::Engine(other.to_string()),
        }
    }
}

/// Run one transaction batch against a pooled connection.
///
/// The whole batch executes inside a single `interact` closure so the
/// transaction never spans an await point.
///
/// # Errors
///
/// Returns `ExecuteError::Abort` when the transaction rolled back, or
/// `ExecuteError::Db` for pool-level failures.
pub async fn execute_transaction(
    db: &Database,
    items: Vec<RequestItem>,
) -> Result<Vec<ResponseItem>, ExecuteError> {
    let conn = db.pool().get().await.map_err(GatewayDbError::from)?;
    let ctx = db.execution_context();
    conn.interact(move |conn| run_batch(conn, &ctx, &items))
        .await
        .map_err(GatewayDbError::from)?
        .map_err(ExecuteError::Abort)
}

/// Synchronous core: begin, run items in order, commit or roll back.
///
/// Dropping the transaction on any error path rolls it back, so every exit
/// leaves the connection outside a transaction.
pub fn run_batch(
    conn: &mut Connection,
    ctx: &ExecutionContext,
    items: &[RequestItem],
) -> Result<Vec<ResponseItem>, TxAbort> {
    // Pooled connections are created lazily, so connection-level settings
    // are re-armed per request; both calls are cheap.
    conn.busy_timeout(BUSY_TIMEOUT).map_err(engine_abort)?;
    if ctx.read_only {
        conn.execute_batch("PRAGMA query_only = ON;")
            .map_err(engine_abort)?;
    }

    let writes = !ctx.read_only && items.iter().any(|item| item.statement.is_some());
    let behavior = if writes {
        TransactionBehavior::Immediate
    } else {
        TransactionBehavior::Deferred
    };
    let tx = conn
        .transaction_with_behavior(behavior)
        .map_err(engine_abort)?;

    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match run_item(&tx, ctx, item) {
            Ok(result) => results.push(result),
            Err(failure) if item.no_fail => results.push(ResponseItem::failure(failure.message())),
            Err(failure) => {
                return Err(TxAbort {
                    class: failure.abort_class(),
                    message: format!("item {index}: {}", failure.message()),
                });
            }
        }
    }

    tx.commit().map_err(engine_abort)?;
    Ok(results)
}

fn engine_abort(err: deadpool_sqlite::rusqlite::Error) -> TxAbort {
    TxAbort {
        class: AbortClass::Engine,
        message: err.to_string(),
    }
}

fn run_item(
    tx: &Transaction,
    ctx: &ExecutionContext,
    item: &RequestItem,
) -> Result<ResponseItem, ItemFailure> {
    let (raw_sql, is_query) = match (&item.query, &item.statement) {
        (Some(query), None) => (query.as_str(), true),
        (None, Some(statement)) => (statement.as_str(), false),
        _ => {
            return Err(ItemFailure::shape(
                "exactly one of 'query' or 'statement' must be provided",
            ));
        }
    };

    let sql = stored::resolve(raw_sql, &ctx.stored, ctx.stored_only).map_err(ItemFailure::Resolve)?;

    if let Some(keyword) = transaction_control(sql) {
        return Err(ItemFailure::TxControl(format!(
            "{keyword} is not allowed; the gateway owns the transaction boundary"
        )));
    }

    if is_query {
        if item.values_batch.is_some() {
            return Err(ItemFailure::shape("valuesBatch is only valid for statements"));
        }
        let params = convert_values(item.values.as_ref())?;
        let rows = run_query(tx, sql, &params)?;
        Ok(ResponseItem::query_ok(rows))
    } else {
        if ctx.read_only {
            return Err(ItemFailure::Engine("database is read-only".into()));
        }
        match (&item.values, &item.values_batch) {
            (Some(_), Some(_)) => Err(ItemFailure::shape(
                "'values' and 'valuesBatch' are mutually exclusive",
            )),
            (None, Some(batch)) => {
                let mut counts = Vec::with_capacity(batch.len());
                for values in batch {
                    let params = params::convert_named_params(values)?;
                    counts.push(run_statement(tx, sql, &params)?);
                }
                Ok(ResponseItem::batch_ok(counts))
            }
            (values, None) => {
                let params = convert_values(values.as_ref())?;
                let rows_updated = run_statement(tx, sql, &params)?;
                Ok(ResponseItem::statement_ok(rows_updated))
            }
        }
    }
}

fn convert_values(
    values: Option<&serde_json::Map<String, serde_json::Value>>,
) -> Result<NamedParams, GatewayDbError> {
    match values {
        Some(map) => params::convert_named_params(map),
        None => Ok(NamedParams::new()),
    }
}

fn run_query(
    tx: &Transaction,
    sql: &str,
    params: &NamedParams,
) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, GatewayDbError> {
    let mut stmt = tx.prepare(sql)?;
    params::bind_named(&mut stmt, params)?;
    let result_set = crate::results::build_result_set(&mut stmt)?;
    Ok(result_set.to_json_rows())
}

/// Execute one (possibly compound) statement. Each sub-statement gets the
/// same named bindings; the reported count is the last sub-statement's
/// affected rows, matching the engine's compound-exec convention.
fn run_statement(
    tx: &Transaction,
    sql: &str,
    params: &NamedParams,
) -> Result<usize, GatewayDbError> {
    let mut rows_updated = 0usize;
    let mut batch = Batch::new(tx, sql);
    while let Some(mut stmt) = batch.next()? {
        params::bind_named(&mut stmt, params)?;
        if stmt.column_count() == 0 {
            rows_updated = stmt.raw_execute()?;
        } else {
            // a SELECT inside a statement item runs but its rows are
            // discarded
            let mut rows = stmt.raw_query();
            while rows.next()?.is_some() {}
        }
    }
    Ok(rows_updated)
}

/// Detect bare transaction-control statements, case-insensitive, trimmed,
/// with an optional trailing semicolon.
fn transaction_control(sql: &str) -> Option<&'static str> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    for keyword in ["BEGIN", "COMMIT", "ROLLBACK"] {
        if trimmed.eq_ignore_ascii_case(keyword) {
            return Some(keyword);
        }
    }
    None
}
