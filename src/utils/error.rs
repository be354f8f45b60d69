use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("{message}")]
    ValidationError { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Failed to bind {addr}: {source}")]
    BindError {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not reach server at {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("Server responded with {status}: {detail}")]
    ServerError { status: u16, detail: String },

    #[error("Upstream service error: {message}")]
    UpstreamError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Network,
    Server,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ConfigError { .. }
            | AppError::MissingConfigError { .. }
            | AppError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AppError::ValidationError { .. }
            | AppError::BadRequest { .. }
            | AppError::PayloadTooLarge { .. }
            | AppError::CsvError(_)
            | AppError::NotFound { .. } => ErrorCategory::Validation,
            AppError::HttpError(_) | AppError::Unreachable { .. } => ErrorCategory::Network,
            AppError::ServerError { .. } | AppError::UpstreamError { .. } => {
                ErrorCategory::Server
            }
            AppError::IoError(_)
            | AppError::SerializationError(_)
            | AppError::ProcessingError { .. } => ErrorCategory::Storage,
            AppError::BindError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 連線失敗（而非伺服器回應錯誤）
    pub fn is_connectivity(&self) -> bool {
        match self {
            AppError::Unreachable { .. } => true,
            AppError::HttpError(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            AppError::Unreachable { endpoint, .. } => {
                format!("Could not reach the API at {}", endpoint)
            }
            AppError::ServerError { status, detail } => {
                format!("The API responded with an error ({}): {}", status, detail)
            }
            AppError::BindError { addr, .. } => {
                format!("Cannot listen on {}: the address is unavailable", addr)
            }
            AppError::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the settings file, environment variables and CLI flags",
            ErrorCategory::Validation => "Fix the submitted data and try again",
            ErrorCategory::Network => "Make sure the API service is running and reachable, then retry",
            ErrorCategory::Server => "Inspect the API service logs for details",
            ErrorCategory::Storage => "Check that the data directory exists and is writable",
            ErrorCategory::System => "Stop the process holding the port or choose another port",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_is_critical() {
        let err = AppError::BindError {
            addr: "127.0.0.1:8000".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("127.0.0.1:8000"));
    }

    #[test]
    fn test_connectivity_is_distinguished_from_server_error() {
        let unreachable = AppError::Unreachable {
            endpoint: "http://localhost:1".to_string(),
            reason: "connection refused".to_string(),
        };
        let server = AppError::ServerError {
            status: 500,
            detail: "boom".to_string(),
        };
        assert!(unreachable.is_connectivity());
        assert!(!server.is_connectivity());
        assert_ne!(unreachable.category(), server.category());
    }
}
