//! Error types for wikibot
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The taxonomy follows the call path: transport failures (connection errors,
//! timeouts, non-2xx statuses), decode failures (a body that is not valid
//! JSON), and API failures (the endpoint's own payload reports a problem,
//! e.g. a login result other than `Success`). At the handle level, transport
//! and decode failures are indistinguishable: both mean "request failed".
//!
//! Every variant is `Clone` because a single failure may be multicast to any
//! number of observers attached to the same [`Deferred`](crate::Deferred).

use thiserror::Error;

/// The main error type for wikibot
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ========================================================================
    // Decode Errors
    // ========================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ========================================================================
    // API Errors
    // ========================================================================
    #[error("API error: {reason}")]
    Api { reason: String },
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
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

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an API error from the endpoint-provided reason string
    pub fn api(reason: impl Into<String>) -> Self {
        Self::Api {
            reason: reason.into(),
        }
    }

    /// Check if this error originated below the API payload level
    /// (connection, status, or body decode failure)
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::HttpStatus { .. } | Error::Decode { .. }
        )
    }

    /// Check if the remote endpoint itself reported the failure
    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // Timeouts are the transport's responsibility and surface as an
        // ordinary transport error.
        Error::Transport {
            message: e.to_string(),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode {
            message: e.to_string(),
        }
    }
}

/// Result type alias for wikibot
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::http_status(503, "Service Unavailable");
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");

        let err = Error::api("WrongPass");
        assert_eq!(err.to_string(), "API error: WrongPass");
    }

    #[test]
    fn test_is_request_failure() {
        assert!(Error::transport("connection refused").is_request_failure());
        assert!(Error::http_status(500, "").is_request_failure());
        assert!(Error::decode("unexpected end of input").is_request_failure());

        assert!(!Error::api("WrongPass").is_request_failure());
        assert!(!Error::config("bad").is_request_failure());
    }

    #[test]
    fn test_is_api() {
        assert!(Error::api("Failure").is_api());
        assert!(!Error::decode("bad json").is_api());
    }

    #[test]
    fn test_clone_preserves_outcome() {
        let err = Error::http_status(404, "Not Found");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
