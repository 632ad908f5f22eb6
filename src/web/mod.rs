//! HTTP query surface
//!
//! A thin transport over the core: handlers translate request parameters into
//! [`StatService`] calls and render the results. The server holds no state of
//! its own beyond the shared service handle.
//!
//! # Routes
//!
//! - `GET /health` - Liveness check
//! - `GET /states?name=` - Catalog lookup with optional name prefix
//! - `POST /query` - Resolve a full query request (JSON body)
//! - `GET /states/{id}/commute-times?year=` - One state's commute times
//! - `GET /states/{id}/commute-methods?year=` - One state's commute methods
//! - `GET /states/{id}/concentrations?year=` - One state's concentrations
//!
//! Query responses carry a `Cache-Control: public, max-age=N` header — an
//! HTTP-level hint for downstream caches, independent of the permanent
//! in-process caches.
//!
//! # Example
//!
//! ```no_run
//! use statgraph::resolve::StatService;
//! use statgraph::source::DataUsaSource;
//! use statgraph::web::QueryServer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = Arc::new(DataUsaSource::new().expect("client"));
//!     let service = Arc::new(StatService::new(source));
//!     let server = QueryServer::new(service, 3600);
//!
//!     server.run("127.0.0.1:4001").await.expect("Server failed");
//! }
//! ```

use crate::resolve::{QueryRequest, StatService};
use crate::StatGraphError;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::warn;

/// Shared server state
struct AppState {
    service: Arc<StatService>,
    cache_max_age_secs: u64,
}

impl AppState {
    fn cache_control(&self) -> (header::HeaderName, String) {
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", self.cache_max_age_secs),
        )
    }
}

/// HTTP server for the query surface
pub struct QueryServer {
    state: Arc<AppState>,
}

impl QueryServer {
    /// Create a new query server around a shared service.
    pub fn new(service: Arc<StatService>, cache_max_age_secs: u64) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                cache_max_age_secs,
            }),
        }
    }

    fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/states", get(list_states))
            .route("/query", post(run_query))
            .route("/states/{id}/commute-times", get(get_commute_times))
            .route("/states/{id}/commute-methods", get(get_commute_methods))
            .route("/states/{id}/concentrations", get(get_concentrations))
            .with_state(state)
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> crate::Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| StatGraphError::Config(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!(
            addr = addr,
            cache_max_age_secs = self.state.cache_max_age_secs,
            "Query server listening"
        );

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(StatGraphError::Io)
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Render the error taxonomy as HTTP statuses. Upstream failures get a
/// generic "try again" body; the process never crashes on them.
fn error_response(err: StatGraphError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        StatGraphError::UnknownState(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown state: {}", id),
            }),
        ),
        err if err.is_upstream() => {
            warn!(error = %err, "Upstream failure");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Statistics source is unavailable, please try again".to_string(),
                }),
            )
        }
        err => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        ),
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct NameParams {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YearParams {
    year: Option<String>,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_states(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let states = state
        .service
        .states(params.name.as_deref())
        .await
        .map_err(error_response)?;

    Ok(([state.cache_control()], Json(states)))
}

async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let views = state
        .service
        .resolve(&request)
        .await
        .map_err(error_response)?;

    Ok(([state.cache_control()], Json(views)))
}

async fn get_commute_times(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<YearParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let records = state
        .service
        .commute_times(&id, params.year.as_deref())
        .await
        .map_err(error_response)?;

    Ok(([state.cache_control()], Json(records)))
}

async fn get_commute_methods(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<YearParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let records = state
        .service
        .commute_methods(&id, params.year.as_deref())
        .await
        .map_err(error_response)?;

    Ok(([state.cache_control()], Json(records)))
}

async fn get_concentrations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<YearParams>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let records = state
        .service
        .concentrations(&id, params.year.as_deref())
        .await
        .map_err(error_response)?;

    Ok(([state.cache_control()], Json(records)))
}
