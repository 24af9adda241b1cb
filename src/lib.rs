/*!
 * SQL Gateway - embedded SQLite databases served over HTTP/JSON
 *
 * This crate exposes one or more SQLite databases as transactional web
 * services. Clients POST a batch of statements and queries to
 * `/{database_id}`; the whole batch executes as a single transaction and
 * the response carries one result per item, in order.
 *
 * # Features
 *
 * - All-or-nothing transaction semantics with per-item `noFail` tolerance
 * - Named-parameter binding from JSON values, including batched bindings
 * - Pre-registered ("stored") statements addressable as `#id`
 * - File, memory and `file:`-URI databases with read-only enforcement
 * - One-time init statements with cleanup when initialization fails
 * - Optional static file serving beside the database routes
 *
 * # Example
 *
 * ```rust,no_run
 * use sql_gateway::prelude::*;
 *
 * async fn serve() -> Result<(), StartupError> {
 *     let config = GatewayConfig {
 *         bind_host: "127.0.0.1".into(),
 *         port: 12321,
 *         databases: vec![
 *             DbDescriptor::new("test", ":memory:")
 *                 .stored_statement("Q", "SELECT 1"),
 *         ],
 *         ..GatewayConfig::default()
 *     };
 *
 *     let handle = launch(config).await?;
 *     // POST http://127.0.0.1:12321/test
 *     // { "transaction": [ { "query": "#Q" } ] }
 *     handle.shutdown().await;
 *     Ok(())
 * }
 * ```
 */

#![forbid(unsafe_code)]

// Core modules
pub mod auth;
pub mod db;
pub mod error;
pub mod executor;
pub mod params;
pub mod request;
pub mod response;
pub mod results;
pub mod server;
pub mod stored;
pub mod types;

// Re-export everything that should be part of the public API
pub mod prelude {
    //! Convenient imports for common functionality.

    pub use crate::auth::{AuthConfig, AuthMode, CredentialEntry};
    pub use crate::db::{DbDescriptor, GatewayConfig, Registry, StoredStatementDef};
    pub use crate::error::{GatewayDbError, StartupError};
    pub use crate::request::{Credentials, RequestItem, TransactionRequest};
    pub use crate::response::{ErrorResponse, ResponseItem, TransactionResponse};
    pub use crate::server::{launch, ApiError, GatewayHandle};
    pub use crate::types::RowValues;
}

pub use db::{DbDescriptor, GatewayConfig};
pub use error::{GatewayDbError, StartupError};
pub use server::{launch, GatewayHandle};
