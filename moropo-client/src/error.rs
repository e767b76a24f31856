//! Error types for the Moropo client

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Moropo client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code, either on the response itself or
    /// inside the response envelope
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Build file to upload does not exist
    #[error("Build file not found: {}", .0.display())]
    BuildNotFound(PathBuf),

    /// Reading the build file failed
    #[error("Failed to read build file: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::api_error(503, "unavailable");
        assert_eq!(err.to_string(), "API error (status 503): unavailable");
    }

    #[test]
    fn test_build_not_found_display() {
        let err = ClientError::BuildNotFound(PathBuf::from("/tmp/app.apk"));
        assert_eq!(err.to_string(), "Build file not found: /tmp/app.apk");
    }
}
