use crate::decision::Action;
use crate::error::SnapshotError;
use crate::order::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    /// Order side that opens a position in this direction.
    #[must_use]
    pub const fn opening_order_side(self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }

    /// Order side that closes a position in this direction.
    #[must_use]
    pub const fn closing_order_side(self) -> OrderSide {
        self.opening_order_side().opposite()
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => f.write_str("LONG"),
            Self::Short => f.write_str("SHORT"),
        }
    }
}

/// Raw position record as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub symbol: String,
    /// Positive for long exposure, negative for short, zero for an empty slot.
    pub signed_quantity: Decimal,
    pub entry_price: Decimal,
    pub unrealized_pnl: Decimal,
}

/// An open position. `quantity` is always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    side: PositionSide,
    quantity: Decimal,
    entry_price: Decimal,
    unrealized_pnl: Decimal,
}

impl Exposure {
    /// Returns `None` unless `quantity > 0`.
    #[must_use]
    pub fn new(
        side: PositionSide,
        quantity: Decimal,
        entry_price: Decimal,
        unrealized_pnl: Decimal,
    ) -> Option<Self> {
        (quantity > Decimal::ZERO).then_some(Self {
            side,
            quantity,
            entry_price,
            unrealized_pnl,
        })
    }

    #[must_use]
    pub const fn side(&self) -> PositionSide {
        self.side
    }

    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    #[must_use]
    pub const fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    #[must_use]
    pub const fn unrealized_pnl(&self) -> Decimal {
        self.unrealized_pnl
    }
}

/// The agent's exposure on the traded instrument, rebuilt from the broker
/// every cycle and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Exposed(Exposure),
}

const FLAT_ACTIONS: [Action; 3] = [Action::OpenLong, Action::OpenShort, Action::Wait];
const EXPOSED_ACTIONS: [Action; 2] = [Action::Close, Action::Wait];

impl PositionState {
    /// Derives the state from the broker's position records for `symbol`.
    ///
    /// Records for other symbols and zero-size records are ignored. More than
    /// one nonzero record is treated as an inconsistency rather than picking one.
    ///
    /// # Errors
    /// Returns [`SnapshotError::MultipleOpenRecords`] when the single-position
    /// assumption does not hold.
    pub fn from_records(symbol: &str, records: &[PositionRecord]) -> Result<Self, SnapshotError> {
        let open: Vec<&PositionRecord> = records
            .iter()
            .filter(|r| r.symbol.eq_ignore_ascii_case(symbol))
            .filter(|r| !r.signed_quantity.is_zero())
            .collect();

        match open.as_slice() {
            [] => Ok(Self::Flat),
            [record] => {
                let side = if record.signed_quantity.is_sign_positive() {
                    PositionSide::Long
                } else {
                    PositionSide::Short
                };
                let exposure = Exposure::new(
                    side,
                    record.signed_quantity.abs(),
                    record.entry_price,
                    record.unrealized_pnl,
                );
                Ok(exposure.map_or(Self::Flat, Self::Exposed))
            }
            many => Err(SnapshotError::MultipleOpenRecords {
                symbol: symbol.to_string(),
                count: many.len(),
            }),
        }
    }

    #[must_use]
    pub const fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    #[must_use]
    pub const fn exposure(&self) -> Option<&Exposure> {
        match self {
            Self::Flat => None,
            Self::Exposed(exposure) => Some(exposure),
        }
    }

    /// Short label used in logs and rejection messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Exposed(_) => "exposed",
        }
    }

    /// Action vocabulary the oracle may choose from in this state.
    #[must_use]
    pub const fn allowed_actions(&self) -> &'static [Action] {
        match self {
            Self::Flat => &FLAT_ACTIONS,
            Self::Exposed(_) => &EXPOSED_ACTIONS,
        }
    }

    #[must_use]
    pub fn allows(&self, action: Action) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Human-readable status line for the decision request.
    #[must_use]
    pub fn status_line(&self, symbol: &str) -> String {
        match self {
            Self::Flat => format!("FLAT: no open position on {symbol}"),
            Self::Exposed(e) => format!(
                "{} {} {} @ {} (unrealized PnL {})",
                e.side,
                e.quantity.normalize(),
                symbol,
                e.entry_price.normalize(),
                e.unrealized_pnl.normalize()
            ),
        }
    }
}
