use crate::config::AppSettings;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "energy-forecast-api")]
#[command(about = "HTTP API for time-series ingestion")]
pub struct ApiCli {
    #[arg(long, env = "ENERGY_FORECAST_CONFIG", help = "Path to a TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Address to bind (overrides server.host)")]
    pub host: Option<String>,

    #[arg(long, help = "Port to bind (overrides server.port)")]
    pub port: Option<u16>,

    #[arg(long, help = "Root data directory (overrides storage.data_dir)")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Log process CPU and memory after each ingestion")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ApiCli {
    pub fn load_settings(&self) -> Result<AppSettings> {
        let mut settings = AppSettings::load(self.config.as_deref())?;
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(dir) = &self.data_dir {
            settings.storage.data_dir = dir.clone();
        }
        Ok(settings)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "energy-forecast-dashboard")]
#[command(about = "Interactive terminal dashboard for the energy forecasting API")]
pub struct DashboardCli {
    #[arg(long, env = "ENERGY_FORECAST_CONFIG", help = "Path to a TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "API base URL, e.g. http://localhost:8000/api/v1")]
    pub api_base: Option<String>,

    #[arg(long, help = "Per-request timeout in seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Disable coloured output")]
    pub no_color: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl DashboardCli {
    pub fn load_settings(&self) -> Result<AppSettings> {
        let mut settings = AppSettings::load(self.config.as_deref())?;
        if let Some(base) = &self.api_base {
            settings.dashboard.api_base = base.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            settings.dashboard.timeout_seconds = timeout;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_cli_overrides() {
        let cli = ApiCli::parse_from([
            "energy-forecast-api",
            "--port",
            "9001",
            "--host",
            "0.0.0.0",
            "--monitor",
        ]);
        assert!(cli.monitor);

        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.server.host, "0.0.0.0");
    }

    #[test]
    fn test_dashboard_cli_overrides() {
        let cli = DashboardCli::parse_from([
            "energy-forecast-dashboard",
            "--api-base",
            "http://10.0.0.5:8000/api/v1",
            "--timeout-secs",
            "3",
        ]);
        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.dashboard.api_base, "http://10.0.0.5:8000/api/v1");
        assert_eq!(settings.dashboard.timeout_seconds, 3);
    }
}
