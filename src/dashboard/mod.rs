//! Interactive terminal dashboard talking to the API service.

pub mod command;

use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::config::AppSettings;
use crate::domain::model::{TimeSeriesUpload, WeatherIngestRequest};
use crate::domain::ports::ForecastApi;
use crate::utils::error::{AppError, Result};

pub use command::{Command, HELP_TEXT};

pub const UPLOAD_SUCCESS_BANNER: &str = "File uploaded and processed successfully!";

/// One dashboard session. Request failures are rendered, never fatal.
pub struct Dashboard<A: ForecastApi, W: Write> {
    api: A,
    settings: AppSettings,
    out: W,
}

impl<A: ForecastApi, W: Write> Dashboard<A, W> {
    pub fn new(api: A, settings: AppSettings, out: W) -> Self {
        Self { api, settings, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Checks liveness once, then executes commands until EOF or `quit`.
    pub async fn run<R>(&mut self, mut reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        writeln!(
            self.out,
            "{}",
            "⚡ Energy Forecasting Dashboard".bold()
        )?;
        writeln!(self.out, "API endpoint: {}", self.api.endpoint())?;
        self.check_health().await?;
        writeln!(self.out, "Type 'help' for the list of commands.")?;

        let mut buf = Vec::new();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            // 非 UTF-8 的輸入只略過該行
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim_end_matches(['\r', '\n']),
                Err(_) => {
                    self.render_error(&AppError::BadRequest {
                        message: "Input line is not valid UTF-8 text".to_string(),
                    })?;
                    continue;
                }
            };
            match Command::parse(line, &self.settings) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await?,
                Err(e) => self.render_error(&e)?,
            }
        }

        writeln!(self.out, "Bye 👋")?;
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Empty | Command::Quit => Ok(()),
            Command::Help => {
                writeln!(self.out, "{}", HELP_TEXT)?;
                Ok(())
            }
            Command::Options => self.render_options(),
            Command::Health => self.check_health().await,
            Command::Series => self.list_series().await,
            Command::Upload {
                path,
                name,
                granularity,
                timezone,
            } => {
                let csv_text = match tokio::fs::read_to_string(&path).await {
                    Ok(text) => text,
                    Err(e) => {
                        let message = format!("Cannot read {}: {}", path.display(), e);
                        writeln!(self.out, "{}", format!("Error processing file: {}", message).red())?;
                        return Ok(());
                    }
                };
                self.upload(TimeSeriesUpload {
                    csv_text,
                    name,
                    granularity,
                    timezone,
                })
                .await
            }
            Command::Weather {
                city,
                country,
                start_date,
                end_date,
            } => {
                self.ingest_weather(WeatherIngestRequest {
                    city,
                    country,
                    start_date,
                    end_date,
                    variables: None,
                })
                .await
            }
        }
    }

    pub async fn check_health(&mut self) -> Result<()> {
        match self.api.health().await {
            Ok(health) => {
                let line = format!(
                    "✅ API status: {} ({} {})",
                    health.status, health.service, health.version
                );
                writeln!(self.out, "{}", line.green())?;
                writeln!(self.out, "{}", serde_json::to_string_pretty(&health)?)?;
                Ok(())
            }
            Err(e) => self.render_error(&e),
        }
    }

    pub async fn upload(&mut self, upload: TimeSeriesUpload) -> Result<()> {
        tracing::debug!("Uploading '{}' ({})", upload.name, upload.granularity);
        match self.api.upload_timeseries(upload).await {
            Ok(response) => {
                writeln!(self.out, "{}", UPLOAD_SUCCESS_BANNER.green().bold())?;
                writeln!(self.out, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            Err(e) if e.is_connectivity() => self.render_error(&e)?,
            Err(e) => {
                let line = format!("Error processing file: {}", detail_of(&e));
                writeln!(self.out, "{}", line.red())?;
            }
        }
        Ok(())
    }

    async fn list_series(&mut self) -> Result<()> {
        match self.api.list_series().await {
            Ok(listing) if listing.series.is_empty() => {
                writeln!(self.out, "No series stored yet.")?;
            }
            Ok(listing) => {
                writeln!(
                    self.out,
                    "{:<24} {:<10} {:>8}  {}",
                    "NAME", "GRANULARITY", "POINTS", "FILE"
                )?;
                for s in listing.series {
                    writeln!(
                        self.out,
                        "{:<24} {:<10} {:>8}  {}",
                        s.name, s.granularity, s.data_points, s.file_path
                    )?;
                }
            }
            Err(e) => self.render_error(&e)?,
        }
        Ok(())
    }

    async fn ingest_weather(&mut self, request: WeatherIngestRequest) -> Result<()> {
        writeln!(
            self.out,
            "🌦️ Fetching weather for {}, {}...",
            request.city, request.country
        )?;
        match self.api.ingest_weather(request).await {
            Ok(response) => {
                writeln!(self.out, "{}", response.message.as_str().green())?;
                writeln!(self.out, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            Err(e) => self.render_error(&e)?,
        }
        Ok(())
    }

    fn render_options(&mut self) -> Result<()> {
        let granularities: Vec<String> = self
            .settings
            .granularity_options()
            .iter()
            .map(|g| format!("{} ({})", g, g.freq_symbol()))
            .collect();
        writeln!(self.out, "Granularities: {}", granularities.join(", "))?;
        writeln!(
            self.out,
            "Timezones:     {}",
            self.settings.ingestion.allowed_timezones.join(", ")
        )?;
        writeln!(
            self.out,
            "Cities:        {}",
            self.settings.weather.city_names.join(", ")
        )?;
        writeln!(
            self.out,
            "Variables:     {}",
            self.settings.weather_variables_options().join(", ")
        )?;
        Ok(())
    }

    /// Connectivity failures and server-side errors are worded differently.
    fn render_error(&mut self, error: &AppError) -> Result<()> {
        if error.is_connectivity() {
            let line = format!("🔌 Cannot reach the API at {}", self.api.endpoint());
            writeln!(self.out, "{}", line.yellow().bold())?;
            if let AppError::Unreachable { reason, .. } = error {
                writeln!(self.out, "   reason: {}", reason)?;
            }
        } else {
            writeln!(self.out, "{}", format!("❌ {}", error.user_friendly_message()).red())?;
        }
        writeln!(self.out, "   💡 {}", error.recovery_suggestion())?;
        Ok(())
    }
}

fn detail_of(error: &AppError) -> String {
    match error {
        AppError::ServerError { detail, .. } => detail.clone(),
        other => other.user_friendly_message(),
    }
}
