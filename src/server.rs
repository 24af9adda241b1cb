use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::auth;
use crate::db::{self, GatewayConfig, Registry};
use crate::error::StartupError;
use crate::executor::{self, AbortClass, ExecuteError};
use crate::request::TransactionRequest;
use crate::response::{ErrorResponse, ResponseItem, TransactionResponse};

/// HTTP-facing request failures; each maps to exactly one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExecuteError> for ApiError {
    fn from(err: ExecuteError) -> Self {
        match err {
            ExecuteError::Abort(abort) => match abort.class {
                AbortClass::BadRequest => ApiError::BadRequest(abort.message),
                AbortClass::Conflict => ApiError::Conflict(abort.message),
                AbortClass::Engine => ApiError::Internal(abort.message),
            },
            ExecuteError::Db(db_err) => ApiError::Internal(db_err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// A running gateway: bound address plus the means to stop it.
#[derive(Debug)]
pub struct GatewayHandle {
    addr: SocketAddr,
    registry: Arc<Registry>,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl GatewayHandle {
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections, wait for in-flight handlers, close every
    /// database pool.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.server.await {
            error!("server task failed: {err}");
        }
        self.registry.close_all();
        info!("gateway stopped");
    }
}

/// Validate the configuration, open every database, bind the listener and
/// start serving.
///
/// Startup is strictly sequential: no traffic is accepted until every
/// database has opened and initialized. Fatal problems come back as
/// `StartupError` so callers (and tests) decide whether to exit.
///
/// # Errors
///
/// Returns `StartupError` for configuration violations, database open/init
/// failures, or a listener bind failure.
pub async fn launch(config: GatewayConfig) -> Result<GatewayHandle, StartupError> {
    db::validate(&config)?;
    let registry = Arc::new(db::open_all(&config.databases).await?);

    let mut app = Router::new()
        .route("/{db_id}", post(handle_transaction))
        .with_state(Arc::clone(&registry));
    if let Some(dir) = &config.serve_dir {
        // databases are POST-only, so GETs fall through to the file server
        // even when a path matches a database id
        app = app.fallback_service(ServeDir::new(dir));
        info!("serving static files from '{}'", dir.display());
    }

    let listener = TcpListener::bind((config.bind_host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        if let Err(err) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("server error: {err}");
        }
    });

    info!(
        "listening on {addr} with {} database(s)",
        registry.len()
    );
    Ok(GatewayHandle {
        addr,
        registry,
        shutdown_tx,
        server,
    })
}

async fn handle_transaction(
    State(registry): State<Arc<Registry>>,
    Path(db_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process(&registry, &db_id, &headers, &body).await {
        Ok(results) => (StatusCode::OK, Json(TransactionResponse { results })).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn process(
    registry: &Registry,
    db_id: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<ResponseItem>, ApiError> {
    let db = registry
        .get(db_id)
        .ok_or_else(|| ApiError::NotFound(format!("database '{db_id}' not found")))?;

    let request: TransactionRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed request: {e}")))?;
    if request.transaction.is_empty() {
        return Err(ApiError::BadRequest("transaction must not be empty".into()));
    }

    if let Some(auth_config) = db.auth() {
        let basic = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(auth::parse_basic_header);
        if !auth_config.authorize(request.credentials.as_ref(), basic.as_ref()) {
            return Err(ApiError::Unauthorized("wrong credentials".into()));
        }
    }

    executor::execute_transaction(db, request.transaction)
        .await
        .map_err(ApiError::from)
}
