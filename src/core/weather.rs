use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::AppSettings;
use crate::utils::error::{AppError, Result};
use crate::utils::validation;

/// Historical hourly weather query for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenMeteoRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub hourly: BTreeSet<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl OpenMeteoRequest {
    pub fn validate(&self, settings: &AppSettings) -> Result<()> {
        validation::validate_range("latitude", self.latitude, -90.0, 90.0)?;
        validation::validate_range("longitude", self.longitude, -180.0, 180.0)?;

        if self.end_date < self.start_date {
            return Err(AppError::validation(
                "end_date cannot be earlier than start_date",
            ));
        }
        if self.hourly.is_empty() {
            return Err(AppError::validation(
                "At least one hourly parameter is required.",
            ));
        }

        let allowed = settings.weather_variables_options();
        if let Some(param) = self.hourly.iter().find(|p| !allowed.contains(p)) {
            return Err(AppError::validation(format!(
                "Hourly parameter '{}' is not supported. Allowed parameters: [{}]",
                param,
                allowed.join(", ")
            )));
        }
        Ok(())
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("start_date", self.start_date.to_string()),
            ("end_date", self.end_date.to_string()),
            ("timezone", self.timezone.clone()),
            (
                "hourly",
                self.hourly.iter().cloned().collect::<Vec<_>>().join(","),
            ),
            ("timeformat", "unixtime".to_string()),
        ]
    }
}

/// Archive endpoint payload (`timeformat=unixtime`).
#[derive(Debug, Clone, Deserialize)]
pub struct ArchivePayload {
    pub latitude: f64,
    pub longitude: f64,
    pub generationtime_ms: f64,
    pub utc_offset_seconds: i32,
    pub elevation: f64,
    #[serde(default)]
    pub hourly_units: BTreeMap<String, String>,
    pub hourly: HourlyBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyBlock {
    pub time: Vec<i64>,
    #[serde(flatten)]
    pub variables: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenMeteoResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub generationtime_ms: f64,
    pub utc_offset_seconds: i32,
    pub elevation: f64,
    pub timestamps: Vec<DateTime<Utc>>,
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
    pub units: BTreeMap<String, String>,
}

impl OpenMeteoResponse {
    /// Keeps the requested variables only, checking shape and offset.
    pub fn from_payload(payload: ArchivePayload, request: &OpenMeteoRequest) -> Result<Self> {
        upstream_coordinates(payload.latitude, payload.longitude)?;
        if payload.utc_offset_seconds != 0 {
            return Err(AppError::UpstreamError {
                message: "utc_offset_seconds must be 0 for UTC timezone".to_string(),
            });
        }

        let timestamps = payload
            .hourly
            .time
            .iter()
            .map(|secs| {
                DateTime::from_timestamp(*secs, 0).ok_or_else(|| AppError::UpstreamError {
                    message: format!("Invalid unix timestamp {}", secs),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut columns = BTreeMap::new();
        let mut units = BTreeMap::new();
        let mut variables = payload.hourly.variables;
        for var in &request.hourly {
            let values = variables.remove(var).ok_or_else(|| AppError::UpstreamError {
                message: format!("Variable '{}' missing from weather response", var),
            })?;
            if values.len() != timestamps.len() {
                return Err(AppError::UpstreamError {
                    message: format!(
                        "Variable '{}' has {} values for {} timestamps",
                        var,
                        values.len(),
                        timestamps.len()
                    ),
                });
            }
            let unit = payload
                .hourly_units
                .get(var)
                .map(|symbol| unit_name(symbol))
                .unwrap_or_else(|| "undefined".to_string());
            units.insert(var.clone(), unit);
            columns.insert(var.clone(), values);
        }

        Ok(Self {
            latitude: payload.latitude,
            longitude: payload.longitude,
            generationtime_ms: payload.generationtime_ms,
            utc_offset_seconds: payload.utc_offset_seconds,
            elevation: payload.elevation,
            timestamps,
            columns,
            units,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// `timestamp,<var>...`; missing readings are left empty.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let mut header = vec!["timestamp".to_string()];
        header.extend(self.columns.keys().cloned());
        writer.write_record(&header)?;

        for (i, ts) in self.timestamps.iter().enumerate() {
            let mut row = vec![ts.format("%Y-%m-%d %H:%M:%S%:z").to_string()];
            row.extend(
                self.columns
                    .values()
                    .map(|values| values[i].map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| AppError::ProcessingError {
            message: format!("CSV output is not valid UTF-8: {}", e),
        })
    }
}

/// Maps an Open-Meteo unit symbol to a descriptive name.
pub fn unit_name(symbol: &str) -> String {
    let name = match symbol {
        "°C" => "celsius",
        "°F" => "fahrenheit",
        "%" => "percentage",
        "mm" => "millimetre",
        "cm" => "centimetre",
        "inch" => "inch",
        "km/h" => "kilometres_per_hour",
        "m/s" => "metre_per_second",
        "mp/h" | "mph" => "miles_per_hour",
        "kn" => "knots",
        "°" => "degree_direction",
        "hPa" => "hectopascal",
        "kPa" => "kilopascal",
        "W/m²" => "watt_per_square_metre",
        "MJ/m²" => "megajoule_per_square_metre",
        "K" => "kelvin",
        "m" => "metre",
        "s" => "seconds",
        "h" => "hours",
        "unixtime" => "unix_time",
        "iso8601" => "iso8601",
        "wmo code" => "wmo_code",
        "" => "undefined",
        other => other,
    };
    name.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingRequest {
    pub name: String,
    /// ISO-3166 alpha-2 country code.
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub elevation: Option<f64>,
}

impl GeocodingResult {
    pub fn validate(&self) -> Result<()> {
        upstream_coordinates(self.latitude, self.longitude)
    }
}

/// Coordinates returned by Open-Meteo; out of range means a bad upstream reply.
fn upstream_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    validation::validate_range("latitude", latitude, -90.0, 90.0)
        .and_then(|_| validation::validate_range("longitude", longitude, -180.0, 180.0))
        .map_err(|e| AppError::UpstreamError {
            message: e.to_string(),
        })
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingPayload {
    #[serde(default)]
    pub results: Vec<GeocodingResult>,
}
