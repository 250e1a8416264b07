//! Error types for Bitget exchange integration.
//!
//! Provides typed errors for authentication, API communication and order
//! rejection, and the mapping into the broker-neutral [`BrokerError`].

use llm_trade_core::BrokerError;
use thiserror::Error;

/// Bitget response code for success.
pub const SUCCESS_CODE: &str = "00000";

/// Response codes that mean the credentials themselves were refused.
const AUTH_CODES: [&str; 4] = ["40006", "40009", "40012", "40037"];

/// Errors that can occur when interacting with Bitget.
#[derive(Debug, Error)]
pub enum BitgetError {
    /// Credentials were refused.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Request signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Non-success HTTP status without a usable Bitget envelope.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Response body.
        message: String,
    },

    /// Bitget processed the request and declined it.
    #[error("rejected ({code}): {message}")]
    Rejected {
        /// Bitget error code, e.g. `40762`.
        code: String,
        /// Bitget error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limit exceeded")]
    RateLimit,

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The envelope was well-formed but its payload was not.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BitgetError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Classifies a non-success Bitget envelope.
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        if AUTH_CODES.contains(&code.as_str()) {
            Self::Authentication(format!("{code}: {message}"))
        } else {
            Self::Rejected { code, message }
        }
    }

    /// Returns true if the error indicates the request could succeed later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BitgetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BitgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<BitgetError> for BrokerError {
    fn from(err: BitgetError) -> Self {
        match err {
            BitgetError::Rejected { code, message } => Self::Rejected { code, message },
            BitgetError::Serialization(msg) | BitgetError::InvalidResponse(msg) => {
                Self::InvalidResponse(msg)
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Result type alias for Bitget operations.
pub type Result<T> = std::result::Result<T, BitgetError>;
