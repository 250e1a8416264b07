use crate::dispatcher::Dispatch;
use llm_trade_core::{
    calculate_order_quantity, Broker, MarketWindow, OrderRequest, OrderResult, PositionSide,
    TradingConfig,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// What was (or would have been) sent, and how it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Execution {
    /// `None` when the order was stopped locally before a quantity existed.
    pub order: Option<OrderRequest>,
    pub result: OrderResult,
    /// False when the order never reached the broker.
    pub submitted: bool,
}

impl Execution {
    fn local_reject(order: Option<OrderRequest>, cause: impl Into<String>) -> Self {
        Self {
            order,
            result: OrderResult::Rejected {
                cause: cause.into(),
            },
            submitted: false,
        }
    }
}

/// Turns a dispatched action into one market order and classifies the outcome.
///
/// Nothing here retries; a failed submission is reported and the next cycle
/// starts from a fresh position snapshot.
#[derive(Debug, Clone)]
pub struct OrderExecutor {
    symbol: String,
    capital: Decimal,
    capital_fraction: Decimal,
    leverage: u32,
    size_decimals: u32,
    min_order_notional: Decimal,
}

impl OrderExecutor {
    #[must_use]
    pub fn new(config: &TradingConfig) -> Self {
        Self {
            symbol: config.symbol.clone(),
            capital: config.capital,
            capital_fraction: config.capital_fraction,
            leverage: config.leverage,
            size_decimals: config.size_decimals,
            min_order_notional: config.min_order_notional,
        }
    }

    /// Builds the opening order at `price`, or explains why none can be sent.
    fn opening_order(&self, side: PositionSide, price: Decimal) -> Result<OrderRequest, Execution> {
        let quantity = calculate_order_quantity(
            self.capital,
            self.capital_fraction,
            self.leverage,
            price,
            self.size_decimals,
        )
        .map_err(|e| Execution::local_reject(None, format!("sizing failed: {e}")))?;

        if quantity <= Decimal::ZERO {
            return Err(Execution::local_reject(
                None,
                format!("order quantity rounds to zero at price {}", price.normalize()),
            ));
        }

        let order = OrderRequest::open(&self.symbol, side.opening_order_side(), quantity);
        let notional = quantity * price;
        if notional < self.min_order_notional {
            return Err(Execution::local_reject(
                Some(order),
                format!(
                    "order notional {} below minimum {}",
                    notional.round_dp(4).normalize(),
                    self.min_order_notional.normalize()
                ),
            ));
        }

        Ok(order)
    }

    /// Executes `dispatch`; returns `None` for [`Dispatch::Hold`].
    pub async fn execute<B: Broker + ?Sized>(
        &self,
        broker: &B,
        dispatch: &Dispatch,
        window: &MarketWindow,
    ) -> Option<Execution> {
        let order = match dispatch {
            Dispatch::Hold(_) => return None,
            Dispatch::Open { side } => {
                let Some(price) = window.last_close().filter(|p| *p > Decimal::ZERO) else {
                    return Some(Execution::local_reject(None, "no reference price for sizing"));
                };
                match self.opening_order(*side, price) {
                    Ok(order) => order,
                    Err(execution) => {
                        tracing::warn!(
                            symbol = %self.symbol,
                            result = ?execution.result,
                            "Opening order not submitted"
                        );
                        return Some(execution);
                    }
                }
            }
            Dispatch::Close {
                position_side,
                quantity,
            } => OrderRequest::close(&self.symbol, position_side.closing_order_side(), *quantity),
        };

        tracing::info!(
            symbol = %order.symbol,
            side = %order.side,
            quantity = %order.quantity.normalize(),
            reduce_only = order.reduce_only,
            "Submitting market order"
        );

        let result = match broker.place_market_order(&order).await {
            Ok(ack) => {
                tracing::info!(order_id = %ack.order_id, "Order accepted");
                OrderResult::from(ack)
            }
            Err(e) => {
                let result = OrderResult::from(e);
                match &result {
                    OrderResult::Rejected { cause } => tracing::warn!(cause = %cause, "Order rejected"),
                    _ => tracing::error!(result = ?result, "Order submission failed"),
                }
                result
            }
        };

        Some(Execution {
            order: Some(order),
            result,
            submitted: true,
        })
    }
}
