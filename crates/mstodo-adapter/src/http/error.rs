/*
[INPUT]:  Error sources (HTTP, API, serialization, auth)
[OUTPUT]: Structured error types with context
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Microsoft To Do adapter
#[derive(Error, Debug)]
pub enum GraphError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Graph API returned an error status
    #[error("Graph API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Authentication failed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Device-authorization flow expired before the operator completed it
    #[error("Device code expired, please restart the sign-in")]
    DeviceCodeExpired,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphError {
    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            GraphError::Authentication { .. } | GraphError::DeviceCodeExpired
        )
    }

    /// Create an API error from status code and response body
    pub fn api_error(status: StatusCode, body: impl Into<String>) -> Self {
        GraphError::Api {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, GraphError>;
