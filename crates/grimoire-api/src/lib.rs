//! # grimoire-api
//!
//! HTTP API for the grimoire note backend: axum router, auth extraction,
//! error mapping, and an explicit server-lifecycle object so tests can run
//! the whole surface in-process without binding a port.

pub mod auth;
pub mod config;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use grimoire_core::{AuthVerifier, Error, NoteComposer, Result};
use grimoire_db::Database;

use config::Config;
use handlers::{folders, notes, tags};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation when chasing a request across subsystems.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store context (notes, folders, tags).
    pub db: Database,
    /// Note composer wired to the store context.
    pub composer: NoteComposer,
    /// Injected credential verifier; swapping auth never touches handlers.
    pub verifier: Arc<dyn AuthVerifier>,
}

impl AppState {
    pub fn new(db: Database, verifier: Arc<dyn AuthVerifier>) -> Self {
        Self {
            composer: db.composer(),
            db,
            verifier,
        }
    }
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP-facing error. Handlers return this; the core taxonomy maps onto it
/// via `From`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::InvalidId(_)
            | Error::MissingTitle
            | Error::InvalidReference(_)
            | Error::DuplicateName { .. }
            | Error::InvalidInput(_) => ApiError::BadRequest(err.to_string()),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(err) => {
                tracing::error!(subsystem = "api", error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Health check: liveness plus the running version.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the application router. Everything under `/api/v1` requires a
/// verified bearer principal; `/health` is open.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Notes
        .route(
            "/api/v1/notes",
            get(notes::list_notes).post(notes::create_note),
        )
        .route(
            "/api/v1/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        // Folders
        .route(
            "/api/v1/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/api/v1/folders/:id",
            get(folders::get_folder)
                .put(folders::update_folder)
                .delete(folders::delete_folder),
        )
        // Tags
        .route("/api/v1/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/api/v1/tags/:id",
            get(tags::get_tag).put(tags::update_tag).delete(tags::delete_tag),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| Error::Config(format!("invalid allowed origin: {origin}")))
        })
        .collect::<Result<_>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}

// =============================================================================
// SERVER LIFECYCLE
// =============================================================================

/// A running API server with explicit start/stop.
///
/// `start` binds the listener (port 0 picks a free port) and spawns the
/// serve loop; `stop` triggers graceful shutdown and awaits it. Nothing
/// here is wired at load time, so tests that only need the core never
/// touch a socket.
pub struct ApiServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl ApiServer {
    pub async fn start(config: &Config, state: AppState) -> Result<Self> {
        let router = app(state).layer(cors_layer(&config.allowed_origins)?);

        let listener = TcpListener::bind((config.host.as_str(), config.port))
            .await
            .map_err(Error::Io)?;
        let addr = listener.local_addr().map_err(Error::Io)?;

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
        });

        info!(subsystem = "api", op = "start", %addr, "server listening");
        Ok(Self {
            addr,
            shutdown: Some(tx),
            task,
        })
    }

    /// The bound address (useful when started on port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Trigger graceful shutdown and wait for in-flight requests to drain.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let served = self
            .task
            .await
            .map_err(|e| Error::Internal(format!("server task failed: {e}")))?;
        served.map_err(Error::Io)?;
        info!(subsystem = "api", op = "stop", "server stopped");
        Ok(())
    }
}
