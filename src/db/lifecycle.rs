use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use deadpool_sqlite::{Config as PoolConfig, Runtime};
use tracing::{info, warn};

use crate::db::config::DbDescriptor;
use crate::db::Database;
use crate::error::{GatewayDbError, StartupError};

/// How a descriptor's `path` translates into an engine connect string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectPlan {
    /// The string handed to the engine (plain path or `file:` URI).
    pub connect: String,
    /// Filesystem location of the backing store, query suffix stripped.
    /// `None` for memory databases.
    pub file_path: Option<PathBuf>,
    pub is_memory: bool,
    /// The backing store did not exist when the plan was computed.
    pub new_file: bool,
}

fn append_uri_param(uri: &str, param: &str) -> String {
    if uri.contains('?') {
        format!("{uri}&{param}")
    } else {
        format!("{uri}?{param}")
    }
}

/// Compute the connect string and new-file judgement for a descriptor.
///
/// The filesystem probe always runs on the query-stripped path: both
/// `foo.db?k=v` and `file:foo.db?k=v` name the file `foo.db`. Memory
/// databases are forced onto a shared cache so every pooled connection
/// sees the same store.
pub(crate) fn plan_connection(desc: &DbDescriptor) -> ConnectPlan {
    let path = desc.path.as_str();

    if path == ":memory:" {
        // private per-open name; plain `:memory:` would give each pooled
        // connection its own database, and a name keyed only by id would
        // leak state between successive opens in one process
        static MEMORY_DB_SEQ: AtomicUsize = AtomicUsize::new(0);
        let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
        return ConnectPlan {
            connect: format!("file:{}-mem-{seq}?mode=memory&cache=shared", desc.id),
            file_path: None,
            is_memory: true,
            new_file: false,
        };
    }

    if let Some(rest) = path.strip_prefix("file:") {
        let (fs_part, query) = match rest.split_once('?') {
            Some((fs, q)) => (fs, Some(q)),
            None => (rest, None),
        };
        let is_memory = fs_part == ":memory:"
            || fs_part.is_empty()
            || query.is_some_and(|q| q.contains("mode=memory"));
        if is_memory {
            let connect = if query.is_some_and(|q| q.contains("cache=shared")) {
                path.to_owned()
            } else {
                append_uri_param(path, "cache=shared")
            };
            return ConnectPlan {
                connect,
                file_path: None,
                is_memory: true,
                new_file: false,
            };
        }

        let file_path = PathBuf::from(fs_part);
        let new_file = !file_path.exists();
        let connect = if desc.read_only {
            append_uri_param(path, "mode=ro")
        } else {
            path.to_owned()
        };
        return ConnectPlan {
            connect,
            file_path: Some(file_path),
            is_memory: false,
            new_file,
        };
    }

    // plain path, possibly carrying a ?-suffix of engine parameters; the
    // suffix forces URI form so the engine sees the parameters
    let (fs_part, query) = match path.split_once('?') {
        Some((fs, q)) => (fs, Some(q)),
        None => (path, None),
    };
    let file_path = PathBuf::from(fs_part);
    let new_file = !file_path.exists();
    let connect = match (query, desc.read_only) {
        (None, false) => fs_part.to_owned(),
        (None, true) => format!("file:{fs_part}?mode=ro"),
        (Some(q), false) => format!("file:{fs_part}?{q}"),
        (Some(q), true) => format!("file:{fs_part}?{q}&mode=ro"),
    };
    ConnectPlan {
        connect,
        file_path: Some(file_path),
        is_memory: false,
        new_file,
    }
}

/// Delete a database file and its `-shm` / `-wal` sidecars, ignoring files
/// that are already gone.
pub(crate) fn remove_with_sidecars(path: &Path) {
    for suffix in ["", "-shm", "-wal"] {
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        let target = PathBuf::from(name);
        if let Err(err) = std::fs::remove_file(&target) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!("could not remove '{}': {err}", target.display());
            }
        }
    }
}

fn db_error(db_id: &str, source: GatewayDbError) -> StartupError {
    StartupError::Database {
        db_id: db_id.to_owned(),
        source,
    }
}

/// Open, configure and initialize one database per its descriptor.
///
/// # Errors
///
/// Returns `StartupError` if the pool cannot be created, the store cannot
/// be opened, or an init statement fails. A failed init on a newly-created
/// file deletes the file and its sidecars before returning.
pub(crate) async fn open_database(desc: &DbDescriptor) -> Result<Database, StartupError> {
    let plan = plan_connection(desc);

    let pool = PoolConfig::new(plan.connect.clone())
        .create_pool(Runtime::Tokio1)
        .map_err(|e| {
            db_error(
                &desc.id,
                GatewayDbError::ConnectionError(format!("failed to create pool: {e}")),
            )
        })?;

    // draw a connection up front: creates the file for read-write
    // descriptors and surfaces bad paths before the listener binds
    let conn = pool
        .get()
        .await
        .map_err(|e| db_error(&desc.id, GatewayDbError::from(e)))?;

    if !desc.disable_wal && !plan.is_memory && !desc.read_only {
        conn.interact(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .map_err(GatewayDbError::from)
        })
        .await
        .map_err(GatewayDbError::from)
        .and_then(|r| r)
        .map_err(|e| db_error(&desc.id, e))?;
    }

    let run_init = !desc.init_statements.is_empty() && (plan.new_file || plan.is_memory);
    if run_init {
        let statements = desc.init_statements.clone();
        let outcome = conn
            .interact(move |conn| -> Result<(), GatewayDbError> {
                let tx = conn.transaction()?;
                for sql in &statements {
                    tx.execute_batch(sql)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(GatewayDbError::from)
            .and_then(|r| r);

        if let Err(source) = outcome {
            drop(conn);
            pool.close();
            if plan.new_file {
                if let Some(file_path) = &plan.file_path {
                    remove_with_sidecars(file_path);
                }
            }
            return Err(StartupError::InitStatementFailed {
                db_id: desc.id.clone(),
                source,
            });
        }
        info!(
            "database '{}': ran {} init statement(s)",
            desc.id,
            desc.init_statements.len()
        );
    }
    drop(conn);

    info!(
        "database '{}': serving from '{}'{}",
        desc.id,
        desc.path,
        if desc.read_only { " (read-only)" } else { "" }
    );

    Ok(Database::assemble(desc.clone(), pool))
}
