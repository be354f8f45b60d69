pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{ApiCli, DashboardCli};

pub use adapters::{ApiClient, LocalStorage, WeatherClient};
pub use api::ApiServer;
pub use config::AppSettings;
pub use crate::core::{IngestionService, TimeSeriesData, TimeSeriesInput};
pub use dashboard::Dashboard;
pub use utils::error::{AppError, Result};
