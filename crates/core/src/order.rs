use crate::error::BrokerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immediate market order. There is no other order type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Set on closing orders so the broker can never flip the position.
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Order that opens a new position.
    pub fn open(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            reduce_only: false,
        }
    }

    /// Order that closes an existing position.
    pub fn close(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            reduce_only: true,
        }
    }
}

/// Broker acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: Option<String>,
}

/// Classified outcome of one submission. Not persisted; drives logging and
/// notification only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderResult {
    Accepted { order_id: String },
    Rejected { cause: String },
    TransportError { cause: String },
}

impl OrderResult {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

impl From<OrderAck> for OrderResult {
    fn from(ack: OrderAck) -> Self {
        Self::Accepted {
            order_id: ack.order_id,
        }
    }
}

impl From<BrokerError> for OrderResult {
    fn from(err: BrokerError) -> Self {
        if err.is_rejection() {
            Self::Rejected {
                cause: err.to_string(),
            }
        } else {
            Self::TransportError {
                cause: err.to_string(),
            }
        }
    }
}
