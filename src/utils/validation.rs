use crate::utils::error::{AppError, Result};
use chrono_tz::Tz;
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<Url> {
    if url_str.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(AppError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let display = path.to_string_lossy();
    if display.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if display.contains('\0') {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: display.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// `allowed_extensions` are written with their leading dot (".csv").
pub fn validate_file_extension(
    field_name: &str,
    path: &Path,
    allowed_extensions: &[String],
) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()));

    match extension {
        Some(ext) if allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(()),
        Some(ext) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: format!(
                "File extension {} is not supported. Supported extensions: {}",
                ext,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_timezone(field_name: &str, name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Unknown IANA timezone".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("dashboard.api_base", "https://example.com").is_ok());
        assert!(validate_url("dashboard.api_base", "http://localhost:8000/api/v1").is_ok());
        assert!(validate_url("dashboard.api_base", "").is_err());
        assert!(validate_url("dashboard.api_base", "invalid-url").is_err());
        assert!(validate_url("dashboard.api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("dashboard.timeout_seconds", 5, 1).is_ok());
        assert!(validate_positive_number("dashboard.timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        let allowed = vec![".csv".to_string()];
        assert!(validate_file_extension("file", Path::new("load_hourly.csv"), &allowed).is_ok());
        assert!(validate_file_extension("file", Path::new("LOAD_hourly.CSV"), &allowed).is_ok());
        assert!(validate_file_extension("file", Path::new("data.txt"), &allowed).is_err());
        assert!(validate_file_extension("file", Path::new("data"), &allowed).is_err());
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("tz", "Europe/Paris").is_ok());
        assert!(validate_timezone("tz", "UTC").is_ok());
        assert!(validate_timezone("tz", "Mars/Olympus").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("latitude", 45.0, -90.0, 90.0).is_ok());
        assert!(validate_range("latitude", 91.0, -90.0, 90.0).is_err());
    }
}
