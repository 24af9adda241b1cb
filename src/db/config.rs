use std::collections::HashSet;
use std::path::PathBuf;

use serde::Deserialize;

use crate::auth::AuthConfig;
use crate::error::StartupError;

/// Top-level gateway configuration, usually decoded from a YAML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for GET requests that do not match a database route.
    #[serde(default)]
    pub serve_dir: Option<PathBuf>,
    #[serde(default)]
    pub databases: Vec<DbDescriptor>,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    12321
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_port(),
            serve_dir: None,
            databases: Vec::new(),
        }
    }
}

/// One database's configuration; immutable once the database is registered.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbDescriptor {
    /// Unique identifier, used as the URL path segment.
    pub id: String,
    /// File path, `:memory:`, or a `file:` URI.
    pub path: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub use_only_stored_statements: bool,
    #[serde(default)]
    pub disable_wal: bool,
    /// Run once when the backing store is first created (every startup for
    /// memory databases).
    #[serde(default)]
    pub init_statements: Vec<String>,
    #[serde(default)]
    pub stored_statements: Vec<StoredStatementDef>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl DbDescriptor {
    #[must_use]
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            read_only: false,
            use_only_stored_statements: false,
            disable_wal: false,
            init_statements: Vec::new(),
            stored_statements: Vec::new(),
            auth: None,
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn use_only_stored_statements(mut self, stored_only: bool) -> Self {
        self.use_only_stored_statements = stored_only;
        self
    }

    #[must_use]
    pub fn disable_wal(mut self, disable_wal: bool) -> Self {
        self.disable_wal = disable_wal;
        self
    }

    #[must_use]
    pub fn init_statement(mut self, sql: impl Into<String>) -> Self {
        self.init_statements.push(sql.into());
        self
    }

    #[must_use]
    pub fn stored_statement(mut self, id: impl Into<String>, sql: impl Into<String>) -> Self {
        self.stored_statements.push(StoredStatementDef {
            id: id.into(),
            sql: sql.into(),
        });
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// A pre-registered SQL text addressable via the `#` sigil.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredStatementDef {
    pub id: String,
    pub sql: String,
}

/// Reject configurations that must never reach the open sequence.
///
/// # Errors
///
/// Returns the first violation found: empty or duplicate database ids,
/// duplicate stored-statement ids within a descriptor, or a read-only
/// database carrying init statements.
pub fn validate(config: &GatewayConfig) -> Result<(), StartupError> {
    let mut seen = HashSet::new();
    for desc in &config.databases {
        if desc.id.is_empty() {
            return Err(StartupError::EmptyDatabaseId);
        }
        if !seen.insert(desc.id.as_str()) {
            return Err(StartupError::DuplicateDatabaseId(desc.id.clone()));
        }
        if desc.read_only && !desc.init_statements.is_empty() {
            return Err(StartupError::ReadOnlyInitStatements(desc.id.clone()));
        }
        let mut stored_seen = HashSet::new();
        for stored in &desc.stored_statements {
            if !stored_seen.insert(stored.id.as_str()) {
                return Err(StartupError::DuplicateStoredStatement {
                    db_id: desc.id.clone(),
                    statement_id: stored.id.clone(),
                });
            }
        }
    }
    Ok(())
}
