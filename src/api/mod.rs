//! REST API endpoints.
//!
//! Axum-based HTTP API serving per-map analytics: fights, round deltas,
//! MVP scores, composite ratings, combat metrics and full match reports.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::calculate::AnalyticsError;
use crate::storage::StorageError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Storage(StorageError::MapNotFound(_))
            | AnalyticsError::PlayerNotFound { .. } => ApiError::NotFound(err.to_string()),
            AnalyticsError::InvalidParameter(_) => ApiError::BadRequest(err.to_string()),
            other => {
                tracing::error!("Analysis failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

/// Build the application router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let cors = match state
        .cors_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new().allow_origin(origin).allow_methods(Any),
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any),
    };

    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/maps", get(routes::maps::list_maps))
        .route("/maps/:map_id/fights", get(routes::maps::fights))
        .route("/maps/:map_id/deltas", get(routes::maps::deltas))
        .route("/maps/:map_id/mvp", get(routes::maps::mvp))
        .route("/maps/:map_id/report", get(routes::maps::report))
        .route(
            "/maps/:map_id/players/:player/rating",
            get(routes::players::rating),
        )
        .route(
            "/maps/:map_id/players/:player/combat",
            get(routes::players::combat),
        );

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
