mod common;

use common::{test_settings, RunningServer, DAILY_CSV};
use energy_forecast::dashboard::{Command, UPLOAD_SUCCESS_BANNER};
use energy_forecast::{ApiClient, AppSettings, Dashboard};
use httpmock::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

fn client(api_base: &str) -> ApiClient {
    ApiClient::new(api_base, Duration::from_secs(5)).unwrap()
}

async fn run_session(api_base: &str, input: &str) -> String {
    let mut dashboard = Dashboard::new(client(api_base), AppSettings::default(), Vec::new());
    dashboard.run(input.as_bytes()).await.unwrap();
    String::from_utf8(dashboard.into_output()).unwrap()
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_unreachable_api_is_reported_without_exiting() {
    let api_base = format!("http://127.0.0.1:{}/api/v1", free_port());
    let out = run_session(&api_base, "health\nseries\nquit\n").await;

    assert!(out.contains(&format!("Cannot reach the API at {}", api_base)));
    assert!(out.matches("Cannot reach the API").count() >= 3);
    assert!(out.contains("Bye"));
}

#[tokio::test]
async fn test_health_and_upload_against_live_server() {
    let temp = TempDir::new().unwrap();
    let server = RunningServer::start(test_settings(temp.path())).await;

    let csv_path = temp.path().join("upload.csv");
    std::fs::write(&csv_path, DAILY_CSV).unwrap();

    let mut dashboard = Dashboard::new(
        client(&server.api_base()),
        AppSettings::default(),
        Vec::new(),
    );
    dashboard.check_health().await.unwrap();
    dashboard
        .execute(Command::Upload {
            path: csv_path.clone(),
            name: "Load Curve".to_string(),
            granularity: "daily".to_string(),
            timezone: "UTC".to_string(),
        })
        .await
        .unwrap();
    dashboard
        .execute(Command::Upload {
            path: csv_path,
            name: "Load Curve".to_string(),
            granularity: "weekly".to_string(),
            timezone: "UTC".to_string(),
        })
        .await
        .unwrap();

    server.stop().await;
    dashboard.check_health().await.unwrap();

    let out = String::from_utf8(dashboard.into_output()).unwrap();
    assert!(out.contains("API status: ok"));
    assert!(out.contains(UPLOAD_SUCCESS_BANNER));
    assert!(out.contains("\"data_points\": 3"));
    assert!(out.contains("Error processing file: Granularity 'weekly' is not supported."));
    assert!(out.contains("Cannot reach the API"));
    assert!(temp.path().join("raw").join("Load Curve_daily.csv").exists());
}

#[tokio::test]
async fn test_server_error_is_not_a_connectivity_error() {
    let mock_server = MockServer::start_async().await;
    let health = mock_server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/health");
            then.status(500)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"detail": "database on fire"}));
        })
        .await;

    let out = run_session(&mock_server.url("/api/v1"), "quit\n").await;
    health.assert_async().await;

    assert!(out.contains("The API responded with an error (500): database on fire"));
    assert!(!out.contains("Cannot reach"));
}
