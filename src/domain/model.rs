use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Hourly, Granularity::Daily, Granularity::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
        }
    }

    pub fn freq_symbol(&self) -> &'static str {
        match self {
            Granularity::Hourly => "H",
            Granularity::Daily => "D",
            Granularity::Monthly => "M",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Granularity::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Granularity::ALL.iter().map(|g| g.as_str()).collect();
                AppError::validation(format!(
                    "Granularity '{}' is not supported. Allowed: [{}]",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}

/// Raw time-series upload, exactly as received at the service boundary.
#[derive(Debug, Clone)]
pub struct TimeSeriesUpload {
    pub csv_text: String,
    pub name: String,
    pub granularity: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: "energy-forecast-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub data_points: usize,
    pub csv: String,
    pub file_path: String,
    pub file_written: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSeries {
    pub name: String,
    pub granularity: Granularity,
    pub data_points: usize,
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesListResponse {
    pub series: Vec<StoredSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherIngestRequest {
    pub city: String,
    pub country: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    /// Defaults to every enabled weather variable.
    #[serde(default)]
    pub variables: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherIngestResponse {
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
    pub data_points: usize,
    pub units: BTreeMap<String, String>,
    pub file_path: String,
    pub file_written: bool,
}

/// Error body returned by every failing route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_parse() {
        assert_eq!("hourly".parse::<Granularity>().unwrap(), Granularity::Hourly);
        assert_eq!("monthly".parse::<Granularity>().unwrap(), Granularity::Monthly);

        let err = "weekly".parse::<Granularity>().unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Granularity 'weekly' is not supported."));
    }

    #[test]
    fn test_granularity_serde_is_lowercase() {
        let json = serde_json::to_string(&Granularity::Daily).unwrap();
        assert_eq!(json, "\"daily\"");
    }
}
