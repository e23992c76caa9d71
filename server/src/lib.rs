use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use catalog_core::{GenerationStats, ScoredRecord, SearchEngine, SearchError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

fn from_search_error(err: SearchError) -> ApiError {
    match err {
        SearchError::NoDataAvailable => api_error(StatusCode::SERVICE_UNAVAILABLE, "No data available"),
        SearchError::CatalogUnavailable { .. } => api_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
    }
}

fn from_join_error(err: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %err, "blocking task failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub admin_token: Option<String>,
}

pub fn build_app(engine: Arc<SearchEngine>, admin_token: Option<String>) -> Router {
    let app_state = AppState { engine, admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", post(search_handler))
        .route("/refresh", post(refresh_handler))
        .route("/debug", get(debug_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<ScoredRecord>>, ApiError> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Query cannot be empty"));
    }
    let start = Instant::now();
    let k = state.engine.config().clamp_k(req.k);
    let category = req.category;
    let engine = Arc::clone(&state.engine);
    let q = query.clone();
    let hits = tokio::task::spawn_blocking(move || engine.search(&q, category.as_deref(), k))
        .await
        .map_err(from_join_error)?
        .map_err(from_search_error)?;
    tracing::info!(query = %query, k, hits = hits.len(), took_s = start.elapsed().as_secs_f64(), "search");
    Ok(Json(hits))
}

pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<GenerationStats>, ApiError> {
    authorize(&state, &headers)?;
    let engine = Arc::clone(&state.engine);
    let generation = tokio::task::spawn_blocking(move || engine.refresh())
        .await
        .map_err(from_join_error)?
        .map_err(from_search_error)?;
    Ok(Json(generation.stats()))
}

/// Snapshot summary with a few sample records; never triggers a build.
pub async fn debug_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let engine_state = state.engine.state();
    let body = match state.engine.current() {
        Some(generation) => {
            let stats = generation.stats();
            let sample: Vec<_> = generation.records().iter().take(3).collect();
            serde_json::json!({
                "state": engine_state,
                "generation": stats.generation,
                "total_records": stats.records,
                "vocabulary_size": stats.vocabulary_size,
                "average_document_length": stats.average_document_length,
                "built_at": stats.built_at,
                "columns": ["id", "title", "category", "description", "tags"],
                "sample_data": sample,
            })
        }
        None => serde_json::json!({
            "state": engine_state,
            "total_records": 0,
            "columns": [],
            "sample_data": [],
        }),
    };
    Json(body)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
