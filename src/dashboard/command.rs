use chrono::NaiveDate;
use std::path::PathBuf;

use crate::config::AppSettings;
use crate::utils::error::{AppError, Result};

pub const DEFAULT_SERIES_NAME: &str = "Load Curve";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Health,
    Upload {
        path: PathBuf,
        name: String,
        granularity: String,
        timezone: String,
    },
    Series,
    Weather {
        city: String,
        country: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    Options,
    Help,
    Quit,
    Empty,
}

impl Command {
    /// Parses one input line. Omitted upload arguments take the form defaults.
    pub fn parse(line: &str, settings: &AppSettings) -> Result<Self> {
        let args = split_args(line)?;
        let Some((head, rest)) = args.split_first() else {
            return Ok(Command::Empty);
        };

        match head.to_lowercase().as_str() {
            "health" | "status" => Ok(Command::Health),
            "upload" => {
                let path = rest.first().ok_or_else(|| {
                    usage("upload <file> [name] [granularity] [timezone]")
                })?;
                let granularity = settings
                    .granularity_options()
                    .first()
                    .map(|g| g.to_string())
                    .unwrap_or_default();
                let timezone = settings
                    .ingestion
                    .allowed_timezones
                    .first()
                    .cloned()
                    .unwrap_or_default();
                Ok(Command::Upload {
                    path: PathBuf::from(path),
                    name: rest
                        .get(1)
                        .cloned()
                        .unwrap_or_else(|| DEFAULT_SERIES_NAME.to_string()),
                    granularity: rest.get(2).cloned().unwrap_or(granularity),
                    timezone: rest.get(3).cloned().unwrap_or(timezone),
                })
            }
            "series" | "list" => Ok(Command::Series),
            "weather" => {
                let [city, country, start, end] = rest else {
                    return Err(usage("weather <city> <country> <start YYYY-MM-DD> <end YYYY-MM-DD>"));
                };
                Ok(Command::Weather {
                    city: city.clone(),
                    country: country.clone(),
                    start_date: parse_date(start)?,
                    end_date: parse_date(end)?,
                })
            }
            "options" => Ok(Command::Options),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(AppError::BadRequest {
                message: format!("Unknown command '{}'. Type 'help' for the list.", other),
            }),
        }
    }
}

fn usage(text: &str) -> AppError {
    AppError::BadRequest {
        message: format!("Usage: {}", text),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// Whitespace split that keeps double-quoted words together.
fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.trim().chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(AppError::BadRequest {
            message: "Unterminated quote".to_string(),
        });
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

pub const HELP_TEXT: &str = "\
Commands:
  health                                   check that the API is up
  upload <file> [name] [granularity] [tz]  upload a timestamp,value CSV
  series                                   list stored series
  weather <city> <country> <start> <end>   ingest hourly weather (dates YYYY-MM-DD)
  options                                  show allowed granularities, timezones and variables
  help                                     show this help
  quit                                     leave the dashboard";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_defaults() {
        let settings = AppSettings::default();
        let cmd = Command::parse("upload data/load.csv", &settings).unwrap();
        assert_eq!(
            cmd,
            Command::Upload {
                path: PathBuf::from("data/load.csv"),
                name: "Load Curve".to_string(),
                granularity: "hourly".to_string(),
                timezone: "UTC".to_string(),
            }
        );
    }

    #[test]
    fn test_quoted_arguments() {
        let settings = AppSettings::default();
        let cmd = Command::parse(r#"upload load.csv "Site A" daily Europe/Paris"#, &settings).unwrap();
        match cmd {
            Command::Upload {
                name,
                granularity,
                timezone,
                ..
            } => {
                assert_eq!(name, "Site A");
                assert_eq!(granularity, "daily");
                assert_eq!(timezone, "Europe/Paris");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Command::parse(r#"upload "load.csv"#, &settings).is_err());
    }

    #[test]
    fn test_weather_and_misc() {
        let settings = AppSettings::default();
        assert_eq!(
            Command::parse("weather Paris FR 2024-01-01 2024-01-07", &settings).unwrap(),
            Command::Weather {
                city: "Paris".to_string(),
                country: "FR".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            }
        );
        assert!(Command::parse("weather Paris FR 2024-01-01", &settings).is_err());
        assert_eq!(Command::parse("   ", &settings).unwrap(), Command::Empty);
        assert_eq!(Command::parse("QUIT", &settings).unwrap(), Command::Quit);
        assert!(Command::parse("dance", &settings).is_err());
    }
}
