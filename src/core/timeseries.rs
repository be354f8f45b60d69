use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::AppSettings;
use crate::core::frequency::{infer_frequency, Frequency};
use crate::domain::model::Granularity;
use crate::utils::error::{AppError, Result};
use crate::utils::validation;

const TIMESTAMP_COLUMN: &str = "timestamp";
const VALUE_COLUMN: &str = "value";
const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
const MIN_DATA_POINTS: usize = 3;

/// Tokens read as missing values rather than numbers.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

/// A validated upload: a regular, tz-aware, strictly positive series.
#[derive(Debug, Clone)]
pub struct TimeSeriesInput {
    pub granularity: Granularity,
    pub timezone: Tz,
    pub frequency: Frequency,
    pub timestamps: Vec<DateTime<Tz>>,
    pub values: Vec<f64>,
}

/// A named series as persisted under the raw data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesData {
    pub name: String,
    pub granularity: Granularity,
    pub points: Vec<DataPoint>,
}

enum RawTimestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl TimeSeriesInput {
    /// Parses and validates CSV text uploaded with its granularity and timezone.
    pub fn from_api_data(
        csv_text: &str,
        granularity: &str,
        timezone: &str,
        settings: &AppSettings,
    ) -> Result<Self> {
        if !settings.is_timezone_allowed(timezone) {
            return Err(AppError::validation(format!(
                "Timezone '{}' not allowed. Allowed: [{}]",
                timezone,
                settings.ingestion.allowed_timezones.join(", ")
            )));
        }
        let tz = validation::validate_timezone("timezone", timezone)?;
        let granularity: Granularity = granularity.parse()?;

        let (raw_timestamps, raw_values) = read_two_columns(csv_text)?;
        let timestamps = localize_timestamps(&raw_timestamps, tz)?;

        if timestamps.len() < MIN_DATA_POINTS {
            return Err(AppError::validation(
                "Series must contain at least three data points.",
            ));
        }

        let frequency = infer_frequency(&timestamps).ok_or_else(|| {
            AppError::validation(
                "Series index frequency could not be inferred; data may be irregular.",
            )
        })?;

        let values = parse_values(&raw_values)?;
        if values.iter().any(|v| *v <= 0.0) {
            return Err(AppError::validation(
                "Data column contains non-positive values.",
            ));
        }

        if !frequency.matches(granularity) {
            tracing::warn!(
                "⚠️ Inferred frequency {} does not match declared granularity {}",
                frequency,
                granularity
            );
        }

        Ok(Self {
            granularity,
            timezone: tz,
            frequency,
            timestamps,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_timeseries(&self, name: &str) -> Result<TimeSeriesData> {
        validate_series_name(name)?;
        let points = self
            .timestamps
            .iter()
            .zip(&self.values)
            .map(|(ts, value)| DataPoint {
                timestamp: ts.fixed_offset(),
                value: *value,
            })
            .collect();

        Ok(TimeSeriesData {
            name: name.trim().to_string(),
            granularity: self.granularity,
            points,
        })
    }
}

impl TimeSeriesData {
    /// `<name>_<granularity>.csv`
    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.name, self.granularity)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record([TIMESTAMP_COLUMN, VALUE_COLUMN])?;
        for point in &self.points {
            writer.write_record([
                point.timestamp.format(OUTPUT_TIMESTAMP_FORMAT).to_string(),
                point.value.to_string(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::IoError(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| AppError::ProcessingError {
            message: format!("CSV output is not valid UTF-8: {}", e),
        })
    }

    /// Loads a stored series, taking name and granularity from the file name.
    pub fn from_csv(path: &Path, settings: &AppSettings) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::NotFound {
                message: format!("File {} does not exist.", path.display()),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_stored(path, &content, settings)
    }

    pub fn from_stored(path: &Path, content: &str, settings: &AppSettings) -> Result<Self> {
        validation::validate_file_extension(
            "file_path",
            path,
            &settings.storage.supported_file_extensions,
        )?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let caps = stored_name_pattern().captures(file_name).ok_or_else(|| {
            AppError::validation(format!(
                "Could not extract granularity from filename: {}",
                file_name
            ))
        })?;
        let name = caps["name"].to_string();
        let granularity: Granularity = caps["granularity"].to_lowercase().parse()?;

        let (raw_timestamps, raw_values) = read_two_columns(content)?;
        let mut points = Vec::with_capacity(raw_timestamps.len());
        for (raw_ts, value) in raw_timestamps.iter().zip(parse_values(&raw_values)?) {
            let timestamp = match parse_timestamp(raw_ts) {
                Some(RawTimestamp::Aware(ts)) => ts,
                Some(RawTimestamp::Naive(_)) => {
                    return Err(AppError::validation(
                        "Series index must be timezone-aware.",
                    ))
                }
                None => return Err(timestamp_error(raw_ts)),
            };
            points.push(DataPoint { timestamp, value });
        }

        Ok(Self {
            name,
            granularity,
            points,
        })
    }
}

pub fn validate_series_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name must be a non-empty string."));
    }
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(AppError::validation(
            "Name must not contain path separators.",
        ));
    }
    Ok(())
}

fn stored_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<name>.+)_(?P<granularity>[^_.]+)\.[A-Za-z0-9]+$")
            .expect("valid stored file pattern")
    })
}

/// Reads a `timestamp` column and exactly one value column, trimming every
/// line and field.
fn read_two_columns(csv_text: &str) -> Result<(Vec<String>, Vec<String>)> {
    let cleaned: Vec<&str> = csv_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if cleaned.is_empty() {
        return Err(AppError::validation(
            "Failed to convert raw CSV text to rows: input is empty.",
        ));
    }
    let cleaned = cleaned.join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(cleaned.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_validation_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let ts_idx = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| AppError::validation("CSV must contain a 'timestamp' column."))?;
    if headers.len() != 2 {
        return Err(AppError::validation(format!(
            "CSV must contain exactly two columns: timestamp and value. Found: [{}]",
            headers.join(", ")
        )));
    }
    let value_idx = 1 - ts_idx;
    if headers[value_idx] != VALUE_COLUMN {
        tracing::debug!("Renaming column '{}' to '{}'", headers[value_idx], VALUE_COLUMN);
    }

    let mut timestamps = Vec::new();
    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_validation_error)?;
        timestamps.push(record[ts_idx].to_string());
        values.push(record[value_idx].to_string());
    }
    Ok((timestamps, values))
}

fn csv_validation_error(e: csv::Error) -> AppError {
    AppError::validation(format!("Failed to convert raw CSV text to rows: {}", e))
}

fn parse_timestamp(raw: &str) -> Option<RawTimestamp> {
    const AWARE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M%:z",
        "%Y-%m-%dT%H:%M%:z",
    ];
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(RawTimestamp::Aware(ts));
    }
    for fmt in AWARE_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(RawTimestamp::Aware(ts));
        }
    }

    let (body, zulu) = match raw.strip_suffix(['Z', 'z']) {
        Some(body) => (body, true),
        None => (raw, false),
    };
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(body, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    if zulu {
        Some(RawTimestamp::Aware(naive.and_utc().fixed_offset()))
    } else {
        Some(RawTimestamp::Naive(naive))
    }
}

fn timestamp_error(raw: &str) -> AppError {
    AppError::validation(format!("Failed to parse timestamp '{}'.", raw))
}

/// Naive input (judged on the first row) is localised into `tz`; offset-aware
/// input is converted into `tz`, reading stray naive rows as UTC.
fn localize_timestamps(raw: &[String], tz: Tz) -> Result<Vec<DateTime<Tz>>> {
    let Some(first) = raw.first() else {
        return Ok(Vec::new());
    };
    let first_is_naive = matches!(parse_timestamp(first), Some(RawTimestamp::Naive(_)));

    raw.iter()
        .map(|item| match (parse_timestamp(item), first_is_naive) {
            (Some(RawTimestamp::Naive(naive)), true) => {
                tz.from_local_datetime(&naive).single().ok_or_else(|| {
                    AppError::validation(format!(
                        "Timestamp '{}' is ambiguous or does not exist in timezone '{}'.",
                        item, tz
                    ))
                })
            }
            (Some(RawTimestamp::Aware(ts)), false) => Ok(ts.with_timezone(&tz)),
            (Some(RawTimestamp::Naive(naive)), false) => {
                Ok(Utc.from_utc_datetime(&naive).with_timezone(&tz))
            }
            (Some(RawTimestamp::Aware(_)), true) => Err(AppError::validation(format!(
                "Failed to parse timestamp '{}': cannot mix naive and offset-aware timestamps.",
                item
            ))),
            (None, _) => Err(timestamp_error(item)),
        })
        .collect()
}

/// All-or-nothing numeric parse, then the missing-value check.
fn parse_values(raw: &[String]) -> Result<Vec<f64>> {
    let mut parsed = Vec::with_capacity(raw.len());
    for item in raw {
        if NA_TOKENS.contains(&item.as_str()) {
            parsed.push(None);
            continue;
        }
        match item.parse::<f64>() {
            Ok(v) if v.is_nan() => parsed.push(None),
            Ok(v) => parsed.push(Some(v)),
            Err(_) => return Err(AppError::validation("Data column must be numeric.")),
        }
    }

    parsed
        .into_iter()
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| AppError::validation("Data column contains null/NaN values."))
}
