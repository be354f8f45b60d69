use anyhow::Result;
use chrono::NaiveDate;
use energy_forecast::domain::model::WeatherIngestRequest;
use energy_forecast::{AppError, AppSettings, IngestionService, LocalStorage};
use httpmock::prelude::*;
use tempfile::TempDir;

fn settings(server: &MockServer, data_dir: &std::path::Path) -> AppSettings {
    let mut settings = AppSettings::default();
    settings.storage.data_dir = data_dir.to_path_buf();
    settings.weather.archive_url = server.url("/v1/archive");
    settings.weather.geocoding_url = server.url("/v1/search");
    settings.weather.retries = 2;
    settings.weather.backoff_ms = 1;
    settings
}

fn request(variables: &[&str]) -> WeatherIngestRequest {
    WeatherIngestRequest {
        city: "Paris".to_string(),
        country: "fr".to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        variables: Some(variables.iter().map(|v| v.to_string()).collect()),
    }
}

#[tokio::test]
async fn test_weather_ingest_geocodes_fetches_and_caches() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start_async().await;

    let geocode = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/search")
                .query_param("name", "Paris")
                .query_param("countryCode", "FR")
                .query_param("count", "1");
            then.status(200).json_body(serde_json::json!({
                "results": [{"name": "Paris", "latitude": 48.85, "longitude": 2.35, "country_code": "FR"}]
            }));
        })
        .await;
    let archive = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/archive")
                .query_param("hourly", "temperature_2m")
                .query_param("timeformat", "unixtime");
            then.status(200).json_body(serde_json::json!({
                "latitude": 48.86,
                "longitude": 2.34,
                "generationtime_ms": 0.2,
                "utc_offset_seconds": 0,
                "elevation": 43.0,
                "hourly_units": {"time": "unixtime", "temperature_2m": "°C"},
                "hourly": {"time": [1704067200, 1704070800], "temperature_2m": [4.1, 3.9]}
            }));
        })
        .await;

    let service = IngestionService::new(
        LocalStorage::new(temp.path()),
        settings(&server, temp.path()),
    )?;

    let response = service.ingest_weather(request(&["temperature_2m"])).await?;
    assert_eq!(response.data_points, 2);
    assert_eq!(response.units["temperature_2m"], "celsius");
    assert!(response.file_written);

    let weather_dir = temp.path().join("raw").join("weather");
    let csv = std::fs::read_to_string(weather_dir.join("Paris_FR_hourly.csv"))?;
    assert!(csv.starts_with("timestamp,temperature_2m\n2024-01-01 00:00:00+00:00,4.1\n"));
    assert!(weather_dir.join("Paris_FR_geocode.json").exists());

    // 第二次應使用快取
    service.ingest_weather(request(&["temperature_2m"])).await?;
    geocode.assert_hits_async(1).await;
    archive.assert_hits_async(2).await;
    Ok(())
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    let geocode = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/search");
            then.status(503).body("unavailable");
        })
        .await;

    let service = IngestionService::new(
        LocalStorage::new(temp.path()),
        settings(&server, temp.path()),
    )
    .unwrap();

    let err = service
        .ingest_weather(request(&["temperature_2m"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UpstreamError { .. }));
    geocode.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    let geocode = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/search");
            then.status(400)
                .json_body(serde_json::json!({"error": true, "reason": "Parameter count must be positive"}));
        })
        .await;

    let service = IngestionService::new(
        LocalStorage::new(temp.path()),
        settings(&server, temp.path()),
    )
    .unwrap();

    let err = service
        .ingest_weather(request(&["temperature_2m"]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Parameter count must be positive"));
    geocode.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_unsupported_variable_rejected_before_any_request() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200);
        })
        .await;

    let service = IngestionService::new(
        LocalStorage::new(temp.path()),
        settings(&server, temp.path()),
    )
    .unwrap();

    let err = service.ingest_weather(request(&["snowfall"])).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError { .. }));
    any.assert_hits_async(0).await;
}
