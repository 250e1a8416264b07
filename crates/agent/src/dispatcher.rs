//! Action dispatch state machine.
//!
//! | state          | BUY        | SELL        | CLOSE                     | WAIT |
//! |----------------|------------|-------------|---------------------------|------|
//! | `Flat`         | open long  | open short  | hold                      | hold |
//! | `Exposed(side)`| hold       | hold        | opposite side, exact qty  | hold |
//!
//! The dispatcher never records what it decided. Whether an order took
//! effect is learned from the next cycle's position snapshot.

use llm_trade_core::{Action, Decision, MarketWindow, PositionSide, PositionState};
use rust_decimal::Decimal;
use serde::Serialize;

/// Why no order is issued this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HoldReason {
    /// The decision was `WAIT`.
    Wait,
    /// The action is not legal in the current state.
    IllegalForState(Action),
    /// No market data this cycle.
    MarketUnavailable,
}

impl std::fmt::Display for HoldReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wait => f.write_str("wait"),
            Self::IllegalForState(action) => write!(f, "{action} not allowed in current state"),
            Self::MarketUnavailable => f.write_str("market data unavailable"),
        }
    }
}

/// The single broker action chosen for a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Dispatch {
    /// Open a new position in `side`.
    Open { side: PositionSide },
    /// Flatten the position: `position_side` is the side being closed and
    /// `quantity` is the broker-reported size, used unchanged.
    Close {
        position_side: PositionSide,
        quantity: Decimal,
    },
    /// No order.
    Hold(HoldReason),
}

impl Dispatch {
    #[must_use]
    pub const fn is_order(&self) -> bool {
        !matches!(self, Self::Hold(_))
    }
}

/// Maps the current state and a decision to at most one broker action.
///
/// Legality is checked again here even though [`Decision::validate`] already
/// checked it; a decision built for a different state must not slip through.
#[must_use]
pub fn dispatch(state: &PositionState, decision: &Decision, window: &MarketWindow) -> Dispatch {
    if !state.allows(decision.action) {
        return Dispatch::Hold(HoldReason::IllegalForState(decision.action));
    }
    if decision.action == Action::Wait {
        return Dispatch::Hold(HoldReason::Wait);
    }
    if !window.is_available() {
        return Dispatch::Hold(HoldReason::MarketUnavailable);
    }

    match (state, decision.action) {
        (PositionState::Flat, Action::OpenLong) => Dispatch::Open {
            side: PositionSide::Long,
        },
        (PositionState::Flat, Action::OpenShort) => Dispatch::Open {
            side: PositionSide::Short,
        },
        (PositionState::Exposed(exposure), Action::Close) => Dispatch::Close {
            position_side: exposure.side(),
            quantity: exposure.quantity(),
        },
        (_, action) => Dispatch::Hold(HoldReason::IllegalForState(action)),
    }
}
