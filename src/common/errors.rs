//! Error types for the application

use thiserror::Error;

/// Result type alias using our BotError
pub type Result<T> = std::result::Result<T, BotError>;

/// Main error type for gateway, strategy and driver operations
#[derive(Error, Debug)]
pub enum BotError {
    /// Price or bar data temporarily unavailable
    #[error("Transient gateway error: {0}")]
    Transient(String),

    /// Order was rejected by the broker
    #[error("Order rejected (retcode {retcode}): {message}")]
    OrderRejected { retcode: u32, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Instrument unknown to the broker
    #[error("Instrument not found: {0}")]
    InstrumentNotFound(String),

    /// Gateway used before `connect` succeeded
    #[error("Gateway is not connected")]
    NotConnected,

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Lot size could not be computed
    #[error("Lot sizing error: {0}")]
    Sizing(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BotError {
    /// True for errors that are expected to clear on their own
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Transient(_) => true,
            BotError::HttpRequest(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
