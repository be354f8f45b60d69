use crate::domain::model::{
    HealthResponse, IngestResponse, SeriesListResponse, TimeSeriesUpload, WeatherIngestRequest,
    WeatherIngestResponse,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &Path) -> impl std::future::Future<Output = bool> + Send;
    /// Files directly under `dir`, relative to the storage root.
    fn list_files(
        &self,
        dir: &Path,
    ) -> impl std::future::Future<Output = Result<Vec<PathBuf>>> + Send;
    /// Location of `path` as reported back to callers.
    fn resolve(&self, path: &Path) -> PathBuf;
}

/// Typed calls the dashboard issues against the API service.
#[async_trait]
pub trait ForecastApi: Send + Sync {
    fn endpoint(&self) -> &str;
    async fn health(&self) -> Result<HealthResponse>;
    async fn upload_timeseries(&self, upload: TimeSeriesUpload) -> Result<IngestResponse>;
    async fn list_series(&self) -> Result<SeriesListResponse>;
    async fn ingest_weather(&self, request: WeatherIngestRequest) -> Result<WeatherIngestResponse>;
}
