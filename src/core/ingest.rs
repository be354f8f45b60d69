use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::adapters::open_meteo::WeatherClient;
use crate::config::AppSettings;
use crate::core::timeseries::{TimeSeriesData, TimeSeriesInput};
use crate::core::weather::{GeocodingRequest, GeocodingResult, OpenMeteoRequest};
use crate::domain::model::{
    IngestResponse, SeriesListResponse, StoredSeries, TimeSeriesUpload, WeatherIngestRequest,
    WeatherIngestResponse,
};
use crate::domain::ports::Storage;
use crate::utils::error::{AppError, Result};
use crate::utils::monitor::SystemMonitor;

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Timeseries data uploaded successfully.";
pub const WEATHER_SUCCESS_MESSAGE: &str = "Weather data ingested successfully.";

/// Validates uploads and persists them under the raw data directory.
///
/// Paths handed to `Storage` are relative to `storage.data_dir`.
pub struct IngestionService<S: Storage> {
    storage: S,
    settings: AppSettings,
    weather: WeatherClient,
    monitor: SystemMonitor,
}

impl<S: Storage> IngestionService<S> {
    pub fn new(storage: S, settings: AppSettings) -> Result<Self> {
        let weather = WeatherClient::new(&settings.weather)?;
        Ok(Self {
            storage,
            settings,
            weather,
            monitor: SystemMonitor::default(),
        })
    }

    pub fn with_monitor(mut self, monitor: SystemMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    fn raw_dir(&self) -> PathBuf {
        self.settings.storage.raw_dir.clone()
    }

    fn weather_dir(&self) -> PathBuf {
        self.raw_dir().join(&self.settings.storage.weather_dir)
    }

    pub async fn ingest_csv(&self, upload: TimeSeriesUpload) -> Result<IngestResponse> {
        tracing::info!(
            "📥 Ingesting series '{}' ({}, {})",
            upload.name,
            upload.granularity,
            upload.timezone
        );

        let input = TimeSeriesInput::from_api_data(
            &upload.csv_text,
            &upload.granularity,
            &upload.timezone,
            &self.settings,
        )?;
        tracing::debug!("Inferred frequency {} for {} points", input.frequency, input.len());

        let series = input.to_timeseries(&upload.name)?;
        let csv = series.to_csv()?;

        let path = self.raw_dir().join(series.file_name());
        self.storage.write_file(&path, csv.as_bytes()).await?;
        let file_written = self.storage.exists(&path).await;
        let file_path = self.storage.resolve(&path);

        tracing::info!(
            "✅ Stored {} data points at {}",
            series.len(),
            file_path.display()
        );
        self.monitor.log_stats("ingest_csv");

        Ok(IngestResponse {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            data_points: series.len(),
            csv,
            file_path: file_path.display().to_string(),
            file_written,
        })
    }

    pub async fn list_series(&self) -> Result<SeriesListResponse> {
        let mut series = Vec::new();
        for path in self.storage.list_files(&self.raw_dir()).await? {
            match self.load_stored(&path).await {
                Ok(data) => series.push(StoredSeries {
                    name: data.name.clone(),
                    granularity: data.granularity,
                    data_points: data.len(),
                    file_path: self.storage.resolve(&path).display().to_string(),
                }),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping {}: {}", path.display(), e);
                }
            }
        }
        Ok(SeriesListResponse { series })
    }

    async fn load_stored(&self, path: &Path) -> Result<TimeSeriesData> {
        let bytes = self.storage.read_file(path).await?;
        let content = String::from_utf8(bytes).map_err(|_| {
            AppError::validation(format!("{} is not valid UTF-8", path.display()))
        })?;
        TimeSeriesData::from_stored(path, &content, &self.settings)
    }

    pub async fn ingest_weather(
        &self,
        request: WeatherIngestRequest,
    ) -> Result<WeatherIngestResponse> {
        let city = request.city.trim().to_string();
        let country = request.country.trim().to_uppercase();
        validate_location(&city, &country)?;

        let hourly: BTreeSet<String> = match request.variables {
            Some(vars) => vars.into_iter().collect(),
            None => self.settings.weather_variables_options().into_iter().collect(),
        };

        // 座標待地理編碼後填入，先檢查日期與變數
        let mut archive_request = OpenMeteoRequest {
            latitude: 0.0,
            longitude: 0.0,
            start_date: request.start_date,
            end_date: request.end_date,
            timezone: "UTC".to_string(),
            hourly,
        };
        archive_request.validate(&self.settings)?;

        let location = self
            .geocode_cached(&GeocodingRequest {
                name: city.clone(),
                country: country.clone(),
            })
            .await?;
        archive_request.latitude = location.latitude;
        archive_request.longitude = location.longitude;

        tracing::info!(
            "🌦️ Fetching weather for {}, {} ({} → {})",
            city,
            country,
            archive_request.start_date,
            archive_request.end_date
        );
        let response = self.weather.fetch_archive(&archive_request).await?;

        let path = self
            .weather_dir()
            .join(format!("{}_{}_hourly.csv", city, country));
        self.storage
            .write_file(&path, response.to_csv()?.as_bytes())
            .await?;
        let file_written = self.storage.exists(&path).await;
        let file_path = self.storage.resolve(&path);

        tracing::info!(
            "✅ Stored {} weather rows at {}",
            response.len(),
            file_path.display()
        );
        self.monitor.log_stats("ingest_weather");

        Ok(WeatherIngestResponse {
            message: WEATHER_SUCCESS_MESSAGE.to_string(),
            latitude: response.latitude,
            longitude: response.longitude,
            data_points: response.len(),
            units: response.units,
            file_path: file_path.display().to_string(),
            file_written,
        })
    }

    /// Geocodes through a JSON file cache kept next to the weather data.
    pub async fn geocode_cached(&self, query: &GeocodingRequest) -> Result<GeocodingResult> {
        let cache_path = self
            .weather_dir()
            .join(format!("{}_{}_geocode.json", query.name, query.country));

        if self.storage.exists(&cache_path).await {
            match self.read_geocode_cache(&cache_path).await {
                Ok(cached) => {
                    tracing::debug!("📍 Geocode cache hit: {}", cache_path.display());
                    return Ok(cached);
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Ignoring broken geocode cache {}: {}",
                        cache_path.display(),
                        e
                    );
                }
            }
        }

        let result = self.weather.geocode(query).await?;
        let json = serde_json::to_vec_pretty(&result)?;
        self.storage.write_file(&cache_path, &json).await?;
        Ok(result)
    }

    async fn read_geocode_cache(&self, path: &Path) -> Result<GeocodingResult> {
        let bytes = self.storage.read_file(path).await?;
        let cached: GeocodingResult = serde_json::from_slice(&bytes)?;
        cached.validate()?;
        Ok(cached)
    }
}

fn validate_location(city: &str, country: &str) -> Result<()> {
    if city.is_empty() {
        return Err(AppError::validation("City must be a non-empty string."));
    }
    if city.contains(['/', '\\', '\0']) || city.contains("..") {
        return Err(AppError::validation(
            "City must not contain path separators.",
        ));
    }
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation(
            "Country must be a two-letter ISO code.",
        ));
    }
    Ok(())
}
