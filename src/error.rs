//! Error types for the connector
//!
//! Every failure aborts the current execution and surfaces to the caller.
//! Nothing in this crate retries; the scheduler running the task owns that policy.

use thiserror::Error;

/// The main error type for the connector
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ============================================================================
    // Upstream (reporting / management API) Errors
    // ============================================================================
    #[error("Upstream request failed: {message}")]
    UpstreamRequest { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Response Parsing Errors
    // ============================================================================
    #[error("Failed to parse response: {message}")]
    Parse { message: String },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    #[error("Sink write failed: {message}")]
    SinkWrite { message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an upstream request error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamRequest {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink(message: impl Into<String>) -> Self {
        Self::SinkWrite {
            message: message.into(),
        }
    }

    /// True for bad or missing configuration, raised before any upstream call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::YamlParse(_)
        )
    }

    /// True for any failure talking to the analytics APIs
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamRequest { .. }
                | Error::Http(_)
                | Error::HttpStatus { .. }
                | Error::InvalidUrl(_)
        )
    }
}

/// Result type alias for the connector
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("view_id");
        assert_eq!(err.to_string(), "Missing required config field: view_id");

        let err = Error::http_status(403, "Forbidden");
        assert_eq!(err.to_string(), "HTTP 403: Forbidden");

        let err = Error::sink("upload failed");
        assert_eq!(err.to_string(), "Sink write failed: upload failed");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::config("x").is_configuration());
        assert!(Error::invalid_value("page_size", "too large").is_configuration());
        assert!(!Error::auth("x").is_configuration());

        assert!(Error::upstream("x").is_upstream());
        assert!(Error::http_status(500, "").is_upstream());
        assert!(!Error::parse("x").is_upstream());
        assert!(!Error::sink("x").is_upstream());
    }
}
