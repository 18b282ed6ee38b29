//! Error types for quote lookups.

use thiserror::Error;

/// Errors that can occur while looking up quotes.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Backend could not be constructed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Provider answered with a non-success status.
    #[error("Provider returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// Provider reported an error in an otherwise successful response.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MarketError::Timeout(err.to_string())
        } else if err.is_decode() {
            MarketError::InvalidResponse(err.to_string())
        } else if err.is_connect() {
            MarketError::Network(format!("Connection failed: {}", err))
        } else {
            MarketError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::InvalidResponse(err.to_string())
    }
}

/// Result type for quote lookups.
pub type MarketResult<T> = std::result::Result<T, MarketError>;
