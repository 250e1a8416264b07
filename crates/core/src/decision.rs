//! Oracle decisions.
//!
//! The oracle's reply is untrusted. It enters the system as a [`RawDecision`]
//! (an opaque parsed JSON value) and only becomes a [`Decision`] after
//! [`Decision::validate`] has checked it against the closed action vocabulary
//! and the current [`PositionState`].

use crate::error::DecisionRejection;
use crate::position::PositionState;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reason recorded when the oracle omits one.
pub const NO_REASON: &str = "no reason given";

/// Closed action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// `BUY`: open a long position.
    OpenLong,
    /// `SELL`: open a short position.
    OpenShort,
    /// `CLOSE`: flatten the current position.
    Close,
    /// `WAIT`: do nothing this cycle.
    Wait,
}

impl Action {
    pub const ALL: [Self; 4] = [Self::OpenLong, Self::OpenShort, Self::Close, Self::Wait];

    /// Wire token used in the response schema.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::OpenLong => "BUY",
            Self::OpenShort => "SELL",
            Self::Close => "CLOSE",
            Self::Wait => "WAIT",
        }
    }

    /// Parses a wire token, ignoring surrounding whitespace and ASCII case.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.token().eq_ignore_ascii_case(token))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Oracle reply parsed as JSON but not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDecision(Value);

impl RawDecision {
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// # Errors
    /// Returns an error if `text` is not JSON.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self)
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.0
    }
}

/// Where a decision came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    /// A validated oracle reply.
    Oracle,
    /// Coerced to `WAIT` because the oracle failed or its reply was invalid.
    Fallback { cause: String },
}

/// A validated decision, legal for the state it was validated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub reason: String,
    pub source: DecisionSource,
}

impl Decision {
    /// Lifts a raw reply into a decision for `state`.
    ///
    /// # Errors
    /// Returns a [`DecisionRejection`] if the reply is not an object, lacks a
    /// string `action`, carries a non-string `reason`, uses an unknown token,
    /// or asks for an action that is not legal in `state`. An absent `reason`
    /// is tolerated.
    pub fn validate(raw: &RawDecision, state: &PositionState) -> Result<Self, DecisionRejection> {
        let object = raw.value().as_object().ok_or(DecisionRejection::NotAnObject)?;

        let token = object
            .get("action")
            .and_then(Value::as_str)
            .ok_or(DecisionRejection::MissingAction)?;
        let action = Action::from_token(token)
            .ok_or_else(|| DecisionRejection::UnknownAction(token.to_string()))?;

        let reason = match object.get("reason") {
            None | Some(Value::Null) => NO_REASON,
            Some(Value::String(reason)) => reason.as_str(),
            Some(_) => return Err(DecisionRejection::InvalidReason),
        };

        if !state.allows(action) {
            return Err(DecisionRejection::IllegalForState {
                action,
                state: state.label(),
            });
        }

        Ok(Self {
            action,
            reason: reason.trim().to_string(),
            source: DecisionSource::Oracle,
        })
    }

    /// `WAIT` decision used in place of a failed or invalid oracle reply.
    pub fn fallback_wait(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Self {
            action: Action::Wait,
            reason: format!("fallback: {cause}"),
            source: DecisionSource::Fallback { cause },
        }
    }

    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self.source, DecisionSource::Fallback { .. })
    }
}
