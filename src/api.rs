//! Unified HTTP API
//!
//! Merges the analysis routes and the memory CRUD router into one axum
//! `Router` with CORS.
//!
//! ## Endpoint Map
//!
//! | Route                          | Description                              |
//! |--------------------------------|------------------------------------------|
//! | `GET /health`                  | Health probe                             |
//! | `POST /api/v1/validate`        | Validate code, returns a report          |
//! | `POST /api/v1/select`          | Scored memory selection for a file       |
//! | `POST /api/v1/context`         | Compressed context bundle for a file     |
//! | `POST /api/v1/patterns/learn`  | Feed a file to the pattern library       |
//! | `GET /api/v1/patterns`         | Recognized patterns for a language       |
//! | `/api/v1/memories[/:id]`       | Memory CRUD (see [`crate::memory::handler`]) |

use crate::config::MemguardConfig;
use crate::engine::Engine;
use crate::error::Error;
use crate::memory::{memory_router, MemoryRecord, MemoryState, MemoryStore};
use crate::selection::ScoredMemory;
use crate::validation::{PatternLibrary, RecognizedPattern};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Shared state for the analysis routes
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub store: Arc<dyn MemoryStore>,
    pub patterns: Arc<RwLock<PatternLibrary>>,
}

impl AppState {
    pub fn new(config: &MemguardConfig, store: Arc<dyn MemoryStore>) -> Self {
        Self {
            engine: Arc::new(Engine::new(config)),
            store,
            patterns: Arc::new(RwLock::new(PatternLibrary::new(config.patterns.clone()))),
        }
    }
}

/// Build the complete HTTP application
pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    let memory_state = MemoryState {
        store: state.store.clone(),
    };

    Router::new()
        .route("/health", get(health_check))
        .merge(analysis_router(state))
        .merge(memory_router(memory_state))
        .layer(build_cors(cors_origins))
}

/// Create the analysis router
pub fn analysis_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/validate", post(validate))
        .route("/api/v1/select", post(select))
        .route("/api/v1/context", post(context))
        .route("/api/v1/patterns", get(list_patterns))
        .route("/api/v1/patterns/learn", post(learn_patterns))
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// API error body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// Map a library error onto a status code and error body.
pub fn error_response(err: Error) -> Response {
    let (status, body) = match &err {
        Error::NotFound(_) => (StatusCode::NOT_FOUND, ApiError::not_found(err.to_string())),
        Error::Conflict(_) => (StatusCode::CONFLICT, ApiError::conflict(err.to_string())),
        Error::InvalidRecord(_) => (StatusCode::BAD_REQUEST, ApiError::bad_request(err.to_string())),
        _ => {
            tracing::error!(error = %err, "Request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal(err.to_string()))
        }
    };
    (status, Json(body)).into_response()
}

// =============================================================================
// Request / Response types
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Request body for validation
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub path: String,
    pub language: Option<String>,
}

/// Request body for selection and context
#[derive(Debug, Deserialize)]
pub struct FileRequest {
    pub path: String,
    pub language: Option<String>,
    /// File text; the server never reads `path` from disk
    pub code: String,
    pub budget: Option<usize>,
}

/// Scored selection response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResponse {
    pub language: String,
    pub selected: Vec<ScoredMemory>,
}

/// Context bundle response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub context: String,
    pub tokens: usize,
    pub included: usize,
    pub forced: usize,
    pub skipped: usize,
}

/// Request body for pattern learning
#[derive(Debug, Deserialize)]
pub struct LearnRequest {
    pub path: String,
    pub code: String,
    pub language: Option<String>,
}

/// Pattern learning response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnResponse {
    pub language: String,
    pub snippets: usize,
    pub recognized: usize,
}

/// Query params for listing patterns
#[derive(Debug, Deserialize)]
pub struct PatternsQuery {
    pub language: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn snapshot(store: &Arc<dyn MemoryStore>) -> Result<Vec<MemoryRecord>, Response> {
    store.load_all().await.map_err(error_response)
}

/// POST /api/v1/validate
async fn validate(State(state): State<AppState>, Json(request): Json<ValidateRequest>) -> Response {
    let corpus = match snapshot(&state.store).await {
        Ok(corpus) => corpus,
        Err(resp) => return resp,
    };
    let language = Engine::resolve_language(request.language.as_deref(), &request.path);
    let patterns = state.patterns.read().await;
    let report = state
        .engine
        .validate(&request.code, &request.path, &language, &corpus, Some(&*patterns));
    Json(report).into_response()
}

/// POST /api/v1/select
async fn select(State(state): State<AppState>, Json(request): Json<FileRequest>) -> Response {
    let corpus = match snapshot(&state.store).await {
        Ok(corpus) => corpus,
        Err(resp) => return resp,
    };
    let language = Engine::resolve_language(request.language.as_deref(), &request.path);
    let features = state
        .engine
        .features(&request.path, &language, Some(request.code.as_str()));
    Json(SelectResponse {
        selected: state.engine.select(&corpus, &features),
        language,
    })
    .into_response()
}

/// POST /api/v1/context
async fn context(State(state): State<AppState>, Json(request): Json<FileRequest>) -> Response {
    let corpus = match snapshot(&state.store).await {
        Ok(corpus) => corpus,
        Err(resp) => return resp,
    };
    let language = Engine::resolve_language(request.language.as_deref(), &request.path);
    let features = state
        .engine
        .features(&request.path, &language, Some(request.code.as_str()));
    let bundle = state.engine.context(&corpus, &features, request.budget);
    Json(ContextResponse {
        context: bundle.text,
        tokens: bundle.tokens,
        included: bundle.included,
        forced: bundle.forced,
        skipped: bundle.skipped,
    })
    .into_response()
}

/// POST /api/v1/patterns/learn
async fn learn_patterns(State(state): State<AppState>, Json(request): Json<LearnRequest>) -> Response {
    let language = Engine::resolve_language(request.language.as_deref(), &request.path);
    let mut library = state.patterns.write().await;
    let snippets = library.learn_file(&language, &request.path, &request.code);
    let recognized = library.recognized_patterns(&language).len();
    Json(LearnResponse {
        language,
        snippets,
        recognized,
    })
    .into_response()
}

/// GET /api/v1/patterns?language=typescript
async fn list_patterns(
    State(state): State<AppState>,
    Query(query): Query<PatternsQuery>,
) -> Json<Vec<RecognizedPattern>> {
    Json(state.patterns.read().await.recognized_patterns(&query.language))
}

/// Only the listed origins get cross-origin access; an empty list keeps the
/// API same-origin.
fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        cors
    } else {
        cors.allow_origin(parsed)
    }
}
