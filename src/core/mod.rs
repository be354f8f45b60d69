pub mod frequency;
pub mod ingest;
pub mod timeseries;
pub mod weather;

pub use crate::domain::model::{Granularity, TimeSeriesUpload};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
pub use ingest::IngestionService;
pub use timeseries::{TimeSeriesData, TimeSeriesInput};
