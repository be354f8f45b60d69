//! HTTP surface of the API service.

pub mod handlers;
pub mod server;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::adapters::storage::LocalStorage;
use crate::core::ingest::IngestionService;
use crate::domain::model::ErrorBody;
use crate::utils::error::AppError;

pub use server::ApiServer;

pub const API_PREFIX: &str = "/api/v1";
pub const WELCOME_MESSAGE: &str = "Welcome to the Energy Forecasting API";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IngestionService<LocalStorage>>,
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .route("/", get(handlers::welcome))
        .route("/health", get(handlers::health))
        .route("/ingest/timeseries-csv", post(handlers::ingest_timeseries_csv))
        .route("/timeseries", get(handlers::list_timeseries))
        .route("/ingest/weather", post(handlers::ingest_weather));

    Router::new()
        .route("/", get(handlers::welcome))
        .nest(API_PREFIX, api)
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::UpstreamError { .. } | AppError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("❌ {} ({:?})", self, self.category());
        } else {
            tracing::debug!("Rejected request: {}", self);
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::BadRequest {
                message: "missing".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge {
                message: "too big".to_string()
            }
            .status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::UpstreamError {
                message: "down".to_string()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::config("broken").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
