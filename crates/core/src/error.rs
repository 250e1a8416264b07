//! Typed errors for the external collaborators and for oracle reply validation.

use crate::decision::Action;
use thiserror::Error;

/// Failure reported by a [`Broker`](crate::traits::Broker) call.
///
/// The split between [`BrokerError::Rejected`] and the transport variants is
/// what order outcome classification is built on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker understood the request and declined it.
    #[error("rejected by broker ({code}): {message}")]
    Rejected {
        /// Broker-specific reason code.
        code: String,
        /// Broker-provided message.
        message: String,
    },

    /// Network, authentication, rate limiting or server-side failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The broker answered with a body that could not be interpreted.
    #[error("invalid broker response: {0}")]
    InvalidResponse(String),
}

impl BrokerError {
    /// Creates a rejection error.
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns true if the broker declined the request (as opposed to the
    /// request never being processed).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Failure reported by a [`DecisionOracle`](crate::traits::DecisionOracle) call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// Connection or protocol failure.
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The call exceeded its timeout.
    #[error("oracle timeout: {0}")]
    Timeout(String),

    /// Non-success HTTP status.
    #[error("oracle API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Response body or message.
        message: String,
    },

    /// The body or the structured reply was not valid JSON of the expected shape.
    #[error("malformed oracle response: {0}")]
    Malformed(String),

    /// The model declined to answer.
    #[error("oracle refused: {0}")]
    Refused(String),
}

impl OracleError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }
}

/// Why an oracle reply could not be lifted into a [`Decision`](crate::decision::Decision).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecisionRejection {
    /// The reply is not a JSON object.
    #[error("reply is not a JSON object")]
    NotAnObject,

    /// `action` is absent or not a string.
    #[error("reply has no string `action` field")]
    MissingAction,

    /// `action` is a string outside the closed vocabulary.
    #[error("unknown action token `{0}`")]
    UnknownAction(String),

    /// `reason` is present but not a string.
    #[error("reply `reason` is not a string")]
    InvalidReason,

    /// The action is a known token but not legal in the current position state.
    #[error("action {action} is not allowed while {state}")]
    IllegalForState {
        /// The action the oracle asked for.
        action: Action,
        /// Short label of the position state.
        state: &'static str,
    },
}

/// Failure reported by a [`HeadlineSource`](crate::traits::HeadlineSource) call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NewsError {
    #[error("news transport error: {0}")]
    Transport(String),

    #[error("news API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("invalid news response: {0}")]
    InvalidResponse(String),
}

/// Why the position snapshot could not be established.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The position query itself failed.
    #[error("position query failed: {0}")]
    Broker(#[from] BrokerError),

    /// More than one nonzero record for a single-position instrument.
    #[error("{count} nonzero position records reported for {symbol}")]
    MultipleOpenRecords {
        /// Instrument symbol.
        symbol: String,
        /// Number of nonzero records.
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(BrokerError::rejected("40762", "insufficient balance").is_rejection());
        assert!(!BrokerError::Transport("connection reset".to_string()).is_rejection());
        assert!(!BrokerError::InvalidResponse("missing data".to_string()).is_rejection());
    }

    #[test]
    fn test_rejection_display_includes_code_and_message() {
        let err = BrokerError::rejected("45110", "less than the minimum order quantity");
        let display = err.to_string();
        assert!(display.contains("45110"));
        assert!(display.contains("minimum order quantity"));
    }

    #[test]
    fn test_illegal_action_display() {
        let err = DecisionRejection::IllegalForState {
            action: Action::OpenLong,
            state: "exposed",
        };
        assert_eq!(err.to_string(), "action BUY is not allowed while exposed");
    }

    #[test]
    fn test_snapshot_error_from_broker() {
        let err: SnapshotError = BrokerError::Transport("timeout".to_string()).into();
        assert!(err.to_string().contains("position query failed"));
    }
}
