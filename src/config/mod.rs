#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::Granularity;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Settings shared by the API service and the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ingestion: IngestionConfig,
    pub weather: WeatherConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub weather_dir: PathBuf,
    pub supported_file_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            raw_dir: PathBuf::from("raw"),
            weather_dir: PathBuf::from("weather"),
            supported_file_extensions: vec![".csv".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub allowed_timezones: Vec<String>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            allowed_timezones: vec!["UTC".to_string(), "Europe/Paris".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub city_names: Vec<String>,
    pub variables: BTreeMap<String, bool>,
    pub archive_url: String,
    pub geocoding_url: String,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        let variables = [
            "temperature_2m",
            "relative_humidity_2m",
            "precipitation",
            "wind_speed_10m",
            "wind_direction_10m",
            "cloud_cover",
            "surface_pressure",
        ]
        .into_iter()
        .map(|name| (name.to_string(), true))
        .collect();

        Self {
            city_names: vec![
                "Abidjan, Côte d'Ivoire".to_string(),
                "Yamoussoukro, Côte d'Ivoire".to_string(),
            ],
            variables,
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            retries: 5,
            backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base: String,
    pub timeout_seconds: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000/api/v1".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl AppSettings {
    /// 依序套用：預設值 → 設定檔 → 環境變數
    pub fn load(config_path: Option<&std::path::Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => toml_config::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `KEY=value` style overrides from any lookup source.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| AppError::InvalidConfigValueError {
                    field: "API_PORT".to_string(),
                    value: port.clone(),
                    reason: "Port must be an integer between 0 and 65535".to_string(),
                })?;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("RAW_DIR") {
            self.storage.raw_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("WEATHER_DIR") {
            self.storage.weather_dir = PathBuf::from(dir);
        }
        if let Some(list) = lookup("SUPPORTED_FILE_EXTENSIONS") {
            self.storage.supported_file_extensions = split_list(&list);
        }
        if let Some(list) = lookup("ALLOWED_TIMEZONES") {
            self.ingestion.allowed_timezones = split_list(&list);
        }
        if let Some(base) = lookup("API_BASE") {
            self.dashboard.api_base = base;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let raw = format!("{}:{}", self.server.host, self.server.port);
        if let Ok(addr) = raw.parse::<SocketAddr>() {
            return Ok(addr);
        }
        // 主機名稱（例如 localhost）需要解析
        std::net::ToSocketAddrs::to_socket_addrs(&raw)
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| AppError::InvalidConfigValueError {
                field: "server.host".to_string(),
                value: self.server.host.clone(),
                reason: "Host does not resolve to a socket address".to_string(),
            })
    }

    pub fn raw_data_dir(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.raw_dir)
    }

    pub fn weather_data_dir(&self) -> PathBuf {
        self.raw_data_dir().join(&self.storage.weather_dir)
    }

    pub fn granularity_options(&self) -> Vec<Granularity> {
        Granularity::ALL.to_vec()
    }

    /// Weather variables enabled for fetching, in name order.
    pub fn weather_variables_options(&self) -> Vec<String> {
        self.weather
            .variables
            .iter()
            .filter(|(_, include)| **include)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_timezone_allowed(&self, tz: &str) -> bool {
        self.ingestion.allowed_timezones.iter().any(|t| t == tz)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            self.storage.data_dir.clone(),
            self.raw_data_dir(),
            self.weather_data_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

impl Validate for AppSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_positive_number(
            "server.max_upload_bytes",
            self.server.max_upload_bytes,
            1,
        )?;

        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        validation::validate_path("storage.raw_dir", &self.storage.raw_dir)?;
        validation::validate_path("storage.weather_dir", &self.storage.weather_dir)?;
        if self.storage.supported_file_extensions.is_empty() {
            return Err(AppError::MissingConfigError {
                field: "storage.supported_file_extensions".to_string(),
            });
        }

        if self.ingestion.allowed_timezones.is_empty() {
            return Err(AppError::MissingConfigError {
                field: "ingestion.allowed_timezones".to_string(),
            });
        }
        for tz in &self.ingestion.allowed_timezones {
            validation::validate_timezone("ingestion.allowed_timezones", tz)?;
        }

        validation::validate_url("weather.archive_url", &self.weather.archive_url)?;
        validation::validate_url("weather.geocoding_url", &self.weather.geocoding_url)?;

        validation::validate_url("dashboard.api_base", &self.dashboard.api_base)?;
        validation::validate_positive_number(
            "dashboard.timeout_seconds",
            self.dashboard.timeout_seconds,
            1,
        )?;

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let settings = AppSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.dashboard.api_base, "http://localhost:8000/api/v1");
        assert_eq!(settings.raw_data_dir(), PathBuf::from("data").join("raw"));
    }

    #[test]
    fn test_port_zero_requests_ephemeral_port() {
        let mut settings = AppSettings::default();
        settings.server.host = "127.0.0.1".to_string();
        settings.server.port = 0;
        assert!(settings.validate().is_ok());
        assert_eq!(settings.bind_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("API_PORT", "9100"),
            ("DATA_DIR", "data_tests"),
            ("ALLOWED_TIMEZONES", "UTC, Europe/Berlin"),
        ]
        .into_iter()
        .collect();

        let mut settings = AppSettings::default();
        settings
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.storage.data_dir, PathBuf::from("data_tests"));
        assert_eq!(
            settings.ingestion.allowed_timezones,
            vec!["UTC".to_string(), "Europe/Berlin".to_string()]
        );
    }

    #[test]
    fn test_invalid_port_override() {
        let mut settings = AppSettings::default();
        let result = settings.apply_overrides(|key| {
            (key == "API_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut settings = AppSettings::default();
        settings.ingestion.allowed_timezones.push("Nowhere/Land".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_weather_variables_options_skip_disabled() {
        let mut settings = AppSettings::default();
        settings
            .weather
            .variables
            .insert("cloud_cover".to_string(), false);
        let options = settings.weather_variables_options();
        assert!(!options.contains(&"cloud_cover".to_string()));
        assert!(options.contains(&"temperature_2m".to_string()));
    }

    #[test]
    fn test_ensure_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut settings = AppSettings::default();
        settings.storage.data_dir = temp.path().join("data");
        settings.ensure_directories().unwrap();
        assert!(settings.weather_data_dir().is_dir());
    }
}
