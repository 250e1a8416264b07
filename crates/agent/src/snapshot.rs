use llm_trade_core::{Broker, PositionState};
use serde::Serialize;

/// Result of the per-cycle position query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Snapshot {
    /// The broker answered and its records were consistent.
    Known(PositionState),
    /// The broker could not be read, or reported an inconsistent ledger.
    /// Nothing is dispatched in a cycle that starts from here.
    Unknown { cause: String },
}

impl Snapshot {
    #[must_use]
    pub const fn state(&self) -> Option<&PositionState> {
        match self {
            Self::Known(state) => Some(state),
            Self::Unknown { .. } => None,
        }
    }
}

/// Reads the authoritative position for `symbol` from the broker.
///
/// Never fails: transport errors and multiple open records both become
/// [`Snapshot::Unknown`].
pub async fn fetch_snapshot<B: Broker + ?Sized>(broker: &B, symbol: &str) -> Snapshot {
    let records = match broker.positions(symbol).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(symbol, error = %e, "Position query failed");
            return Snapshot::Unknown {
                cause: e.to_string(),
            };
        }
    };

    match PositionState::from_records(symbol, &records) {
        Ok(state) => {
            tracing::debug!(symbol, state = state.label(), "Position snapshot");
            Snapshot::Known(state)
        }
        Err(e) => {
            tracing::warn!(symbol, error = %e, "Inconsistent position ledger, skipping cycle");
            Snapshot::Unknown {
                cause: e.to_string(),
            }
        }
    }
}
