// Database layer:
// - config: descriptors, gateway config, startup validation
// - lifecycle: connect-string planning, open/init sequence, cleanup
// - Registry: the immutable id → handle map shared by all request handlers

pub mod config;
mod lifecycle;

use std::collections::HashMap;
use std::sync::Arc;

use deadpool_sqlite::Pool;
use tracing::info;

pub use config::{validate, DbDescriptor, GatewayConfig, StoredStatementDef};

use crate::auth::AuthConfig;
use crate::error::StartupError;
use crate::executor::ExecutionContext;

/// An open database: its descriptor, its stored-statement table and the
/// connection pool every request draws from.
pub struct Database {
    descriptor: DbDescriptor,
    stored: Arc<HashMap<String, String>>,
    pool: Pool,
}

// Manual Debug implementation; the pool's Debug output is noise
impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("id", &self.descriptor.id)
            .field("path", &self.descriptor.path)
            .field("read_only", &self.descriptor.read_only)
            .finish()
    }
}

impl Database {
    pub(crate) fn assemble(descriptor: DbDescriptor, pool: Pool) -> Self {
        let stored = Arc::new(
            descriptor
                .stored_statements
                .iter()
                .map(|s| (s.id.clone(), s.sql.clone()))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            descriptor,
            stored,
            pool,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    #[must_use]
    pub fn auth(&self) -> Option<&AuthConfig> {
        self.descriptor.auth.as_ref()
    }

    /// Snapshot the state a batch execution needs on the blocking pool.
    #[must_use]
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext {
            read_only: self.descriptor.read_only,
            stored_only: self.descriptor.use_only_stored_statements,
            stored: Arc::clone(&self.stored),
        }
    }
}

/// The id → handle map. Built once at startup, read-only afterwards; the
/// registry outlives every request handler.
#[derive(Debug, Default)]
pub struct Registry {
    databases: HashMap<String, Arc<Database>>,
}

impl Registry {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Database>> {
        self.databases.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Close every pool. Idempotent; called once at shutdown.
    pub fn close_all(&self) {
        for (id, db) in &self.databases {
            db.pool.close();
            info!("database '{id}': closed");
        }
    }
}

/// Open and initialize every configured database, in order. The config is
/// expected to have passed `validate` already.
///
/// # Errors
///
/// Returns the first `StartupError` encountered; databases opened before
/// the failure are dropped.
pub async fn open_all(descriptors: &[DbDescriptor]) -> Result<Registry, StartupError> {
    let mut databases = HashMap::with_capacity(descriptors.len());
    for desc in descriptors {
        let db = lifecycle::open_database(desc).await?;
        databases.insert(desc.id.clone(), Arc::new(db));
    }
    Ok(Registry { databases })
}
