use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

use crate::config::WeatherConfig;
use crate::core::weather::{
    ArchivePayload, GeocodingPayload, GeocodingRequest, GeocodingResult, OpenMeteoRequest,
    OpenMeteoResponse,
};
use crate::utils::error::{AppError, Result};

/// Client for the Open-Meteo archive and geocoding endpoints.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    archive_url: String,
    geocoding_url: String,
    retries: u32,
    backoff: Duration,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            archive_url: config.archive_url.clone(),
            geocoding_url: config.geocoding_url.clone(),
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    pub async fn fetch_archive(&self, request: &OpenMeteoRequest) -> Result<OpenMeteoResponse> {
        let params = request.query_params();
        tracing::debug!("🌦️ Fetching weather archive from: {}", self.archive_url);

        let response = self
            .send_with_retry(|| self.client.get(&self.archive_url).query(&params))
            .await?;
        let payload: ArchivePayload = response.json().await?;
        OpenMeteoResponse::from_payload(payload, request)
    }

    pub async fn geocode(&self, query: &GeocodingRequest) -> Result<GeocodingResult> {
        let params = [
            ("name", query.name.as_str()),
            ("count", "1"),
            ("countryCode", query.country.as_str()),
            ("language", "en"),
            ("format", "json"),
        ];
        tracing::debug!("📍 Geocoding {} ({})", query.name, query.country);

        let response = self
            .send_with_retry(|| {
                self.client
                    .get(&self.geocoding_url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .query(&params)
            })
            .await?;
        let payload: GeocodingPayload = response.json().await?;

        let result = payload
            .results
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound {
                message: format!("No geocoding result for {}, {}", query.name, query.country),
            })?;
        result.validate()?;
        Ok(result)
    }

    /// Retries connection failures, timeouts, 429 and 5xx with exponential
    /// backoff. Other error statuses are returned immediately.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let outcome = build().send().await;
            let retryable = match &outcome {
                Ok(resp) => is_retryable_status(resp.status()),
                Err(e) => e.is_connect() || e.is_timeout(),
            };

            if retryable && attempt < self.retries {
                let delay = self.backoff * 2u32.saturating_pow(attempt);
                tracing::warn!(
                    "🔄 Weather request failed (attempt {}/{}), retrying in {:?}",
                    attempt + 1,
                    self.retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let response = outcome?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::UpstreamError {
                    message: format!("Open-Meteo returned {}: {}", status, reason_of(&body)),
                });
            }
            return Ok(response);
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Open-Meteo errors look like `{"error": true, "reason": "..."}`.
fn reason_of(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("reason").and_then(|r| r.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
