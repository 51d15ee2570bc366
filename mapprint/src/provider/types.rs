//! Provider types

use std::fmt;

/// Errors that can occur while addressing or downloading provider tiles.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed. `status` is `None` when no response was received.
    HttpError {
        status: Option<u16>,
        message: String,
    },
    /// Request did not complete within the configured timeout
    Timeout(String),
    /// Response body could not be used (empty, not an image, ...)
    InvalidResponse(String),
    /// Provider identifier does not name a known addressing scheme
    UnknownProvider(String),
    /// URL template is missing placeholders or has an unterminated token
    MalformedTemplate { template: String, reason: String },
}

impl ProviderError {
    /// Shorthand for an HTTP error that never produced a response.
    pub fn connection(message: impl Into<String>) -> Self {
        ProviderError::HttpError {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for an HTTP error with a response status.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        ProviderError::HttpError {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Returns true if retrying the same request may succeed.
    ///
    /// Timeouts, connection failures, 408, 429 and 5xx responses are
    /// transient. Other statuses and unusable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::HttpError { status: None, .. } => true,
            ProviderError::HttpError {
                status: Some(status),
                ..
            } => *status >= 500 || *status == 429 || *status == 408,
            ProviderError::Timeout(_) => true,
            ProviderError::InvalidResponse(_)
            | ProviderError::UnknownProvider(_)
            | ProviderError::MalformedTemplate { .. } => false,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError {
                status: Some(status),
                message,
            } => write!(f, "HTTP error {}: {}", status, message),
            ProviderError::HttpError {
                status: None,
                message,
            } => write!(f, "HTTP error: {}", message),
            ProviderError::Timeout(url) => write!(f, "Request timed out: {}", url),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::UnknownProvider(id) => {
                write!(
                    f,
                    "Unknown provider '{}' (expected one of: osm, xyz, bing, quadkey)",
                    id
                )
            }
            ProviderError::MalformedTemplate { template, reason } => {
                write!(f, "Malformed URL template '{}': {}", template, reason)
            }
        }
    }
}

impl std::error::Error for ProviderError {}
