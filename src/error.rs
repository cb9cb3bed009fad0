use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single request against the dashboard proxy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Network unreachable, connection reset, TLS failure...
    #[error("{0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The proxy answered but reported a logical failure.
    #[error("{0}")]
    Rejected(String),

    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Failed to read file: {0}")]
    Io(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout(error.to_string())
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Decode(error.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(error: std::io::Error) -> Self {
        ApiError::Io(error.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
