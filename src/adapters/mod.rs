pub mod api_client;
pub mod open_meteo;
pub mod storage;

pub use api_client::ApiClient;
pub use open_meteo::WeatherClient;
pub use storage::LocalStorage;
