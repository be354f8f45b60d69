use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::domain::model::{
    ErrorBody, HealthResponse, IngestResponse, SeriesListResponse, TimeSeriesUpload,
    WeatherIngestRequest, WeatherIngestResponse,
};
use crate::domain::ports::ForecastApi;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_url;

/// Typed HTTP client for the API service, one method per route.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// `base_url` is the versioned API root, e.g. `http://localhost:8000/api/v1`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        validate_url("api_base", base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    fn transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Unreachable {
                endpoint: self.base_url.clone(),
                reason: format!("no response within {}s", self.timeout.as_secs()),
            }
        } else if e.is_connect() || e.is_request() {
            AppError::Unreachable {
                endpoint: self.base_url.clone(),
                reason: root_cause(&e),
            }
        } else {
            AppError::HttpError(e)
        }
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.detail)
            .unwrap_or(body);
        Err(AppError::ServerError {
            status: status.as_u16(),
            detail,
        })
    }
}

fn root_cause(e: &(dyn std::error::Error + 'static)) -> String {
    let mut current = e;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[async_trait]
impl ForecastApi for ApiClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn health(&self) -> Result<HealthResponse> {
        tracing::debug!("GET {}/health", self.base_url);
        self.execute(self.client.get(self.url("/health"))).await
    }

    async fn upload_timeseries(&self, upload: TimeSeriesUpload) -> Result<IngestResponse> {
        let file = Part::text(upload.csv_text)
            .file_name("data.csv")
            .mime_str("text/csv")?;
        let form = Form::new()
            .part("file", file)
            .text("name", upload.name)
            .text("granularity", upload.granularity)
            .text("timezone", upload.timezone);

        tracing::debug!("POST {}/ingest/timeseries-csv", self.base_url);
        self.execute(
            self.client
                .post(self.url("/ingest/timeseries-csv"))
                .multipart(form),
        )
        .await
    }

    async fn list_series(&self) -> Result<SeriesListResponse> {
        self.execute(self.client.get(self.url("/timeseries"))).await
    }

    async fn ingest_weather(&self, request: WeatherIngestRequest) -> Result<WeatherIngestResponse> {
        self.execute(
            self.client
                .post(self.url("/ingest/weather"))
                .json(&request),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoint() {
        assert!(ApiClient::new("localhost:8000", Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/api/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/v1");
        assert_eq!(client.url("/health"), "http://localhost:8000/api/v1/health");
    }
}
