use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Json;

use crate::api::{AppState, WELCOME_MESSAGE};
use crate::domain::model::{
    HealthResponse, IngestResponse, SeriesListResponse, TimeSeriesUpload, WeatherIngestRequest,
    WeatherIngestResponse, WelcomeResponse,
};
use crate::utils::error::{AppError, Result};

pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

pub async fn ingest_timeseries_csv(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestResponse>> {
    let multipart = multipart.map_err(|rejection| AppError::BadRequest {
        message: rejection.body_text(),
    })?;
    let upload = read_upload(multipart).await?;
    let response = state.service.ingest_csv(upload).await?;
    Ok(Json(response))
}

/// Unmatched routes answer with the same JSON error body as handlers.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound {
        message: format!("No route for {}", uri.path()),
    }
}

pub async fn list_timeseries(State(state): State<AppState>) -> Result<Json<SeriesListResponse>> {
    Ok(Json(state.service.list_series().await?))
}

pub async fn ingest_weather(
    State(state): State<AppState>,
    payload: std::result::Result<Json<WeatherIngestRequest>, JsonRejection>,
) -> Result<Json<WeatherIngestResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    Ok(Json(state.service.ingest_weather(request).await?))
}

/// Collects the `file`, `name`, `granularity` and `timezone` form fields.
async fn read_upload(mut multipart: Multipart) -> Result<TimeSeriesUpload> {
    let mut csv_text = None;
    let mut name = None;
    let mut granularity = None;
    let mut timezone = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                if let Some(file_name) = field.file_name() {
                    tracing::debug!("Receiving upload {}", file_name);
                }
                let bytes = field.bytes().await.map_err(multipart_error)?;
                let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    AppError::validation("Uploaded file must be UTF-8 encoded text.")
                })?;
                csv_text = Some(text);
            }
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "granularity" => granularity = Some(field.text().await.map_err(multipart_error)?),
            "timezone" => timezone = Some(field.text().await.map_err(multipart_error)?),
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(TimeSeriesUpload {
        csv_text: required(csv_text, "file")?,
        name: required(name, "name")?,
        granularity: required(granularity, "granularity")?,
        timezone: required(timezone, "timezone")?,
    })
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value.ok_or_else(|| AppError::BadRequest {
        message: format!("Missing form field '{}'", field),
    })
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            message: e.body_text(),
        }
    } else {
        AppError::BadRequest {
            message: e.body_text(),
        }
    }
}
