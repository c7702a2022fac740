//! Error types and HTTP mapping for the weather records service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the weather records service
#[derive(Error, Debug)]
pub enum WeatherRecordError {
    /// Client input errors (bad date range, malformed coordinates, blank query)
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration errors, e.g. a missing API key
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream provider answered with a failure status or could not be reached
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Record lookup failed
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Export requested over an empty record set
    #[error("Nothing to export: {message}")]
    EmptyExport { message: String },

    /// Record store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherRecordError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an upstream error carrying the provider's status code
    pub fn upstream<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn empty_export<S: Into<String>>(message: S) -> Self {
        Self::EmptyExport {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// HTTP status this error is served with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Config { .. } | Self::Store { .. } | Self::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::NotFound { .. } | Self::EmptyExport { .. } => StatusCode::NOT_FOUND,
        }
    }

    /// Get the message shown to API clients
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message }
            | Self::Config { message }
            | Self::Upstream { message, .. }
            | Self::NotFound { message }
            | Self::EmptyExport { message } => message.clone(),
            Self::Store { .. } => "A storage error occurred".to_string(),
            Self::Io { .. } => "An I/O error occurred".to_string(),
        }
    }
}

impl From<serde_json::Error> for WeatherRecordError {
    fn from(err: serde_json::Error) -> Self {
        Self::store(format!("Invalid stored document: {err}"))
    }
}

impl From<fjall::Error> for WeatherRecordError {
    fn from(err: fjall::Error) -> Self {
        Self::store(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WeatherRecordError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::store(format!("Store task failed: {err}"))
    }
}

impl IntoResponse for WeatherRecordError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }

        let body = Json(json!({ "detail": self.user_message() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = WeatherRecordError::config("missing API key");
        assert!(matches!(config_err, WeatherRecordError::Config { .. }));

        let upstream_err = WeatherRecordError::upstream(404, "city not found");
        assert!(matches!(
            upstream_err,
            WeatherRecordError::Upstream { status: 404, .. }
        ));

        let validation_err = WeatherRecordError::validation("invalid coordinates");
        assert!(matches!(validation_err, WeatherRecordError::Validation { .. }));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WeatherRecordError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WeatherRecordError::config("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WeatherRecordError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WeatherRecordError::upstream(401, "x").status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_upstream_non_error_status_becomes_bad_gateway() {
        assert_eq!(
            WeatherRecordError::upstream(204, "x").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            WeatherRecordError::upstream(42, "x").status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_user_messages() {
        let upstream_err = WeatherRecordError::upstream(404, "city not found");
        assert_eq!(upstream_err.user_message(), "city not found");

        let store_err = WeatherRecordError::store("disk on fire");
        assert!(!store_err.user_message().contains("disk"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WeatherRecordError = io_err.into();
        assert!(matches!(err, WeatherRecordError::Io { .. }));
    }
}
