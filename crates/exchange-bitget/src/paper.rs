use async_trait::async_trait;
use llm_trade_core::{
    calculate_required_margin, Bar, Broker, BrokerError, OrderAck, OrderRequest, OrderSide,
    PaperConfig, PositionRecord, PositionSide,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// Paper trading broker for running the agent against live market data.
///
/// Candles come from the wrapped market-data broker. Orders never leave the
/// process: they fill immediately at the latest close, and the account
/// (balance and at most one position) lives in memory only.
///
/// # Safety
///
/// This broker makes **zero order API calls**. The wrapped broker is only
/// asked for candles.
pub struct PaperBroker<B> {
    market: B,
    timeframe: String,
    leverage: u32,
    commission_rate: Decimal,
    account: Mutex<PaperAccount>,
}

#[derive(Debug, Clone)]
struct PaperPosition {
    symbol: String,
    side: PositionSide,
    quantity: Decimal,
    entry_price: Decimal,
    margin: Decimal,
}

#[derive(Debug)]
struct PaperAccount {
    /// Free balance: starting balance plus realized PnL, minus fees and locked margin.
    balance: Decimal,
    position: Option<PaperPosition>,
    last_price: Option<Decimal>,
    orders_filled: u64,
}

impl<B: Broker> PaperBroker<B> {
    /// Creates a paper broker that prices fills from `market` candles at `timeframe`.
    #[must_use]
    pub fn new(market: B, config: &PaperConfig, timeframe: impl Into<String>, leverage: u32) -> Self {
        Self {
            market,
            timeframe: timeframe.into(),
            leverage: leverage.max(1),
            commission_rate: config.commission_rate,
            account: Mutex::new(PaperAccount {
                balance: config.starting_balance,
                position: None,
                last_price: None,
                orders_filled: 0,
            }),
        }
    }

    /// Free balance in the margin coin.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.account.lock().balance
    }

    /// Balance plus locked margin plus unrealized PnL at the last seen price.
    #[must_use]
    pub fn equity(&self) -> Decimal {
        let account = self.account.lock();
        let open = account.position.as_ref().map_or(Decimal::ZERO, |p| {
            p.margin + unrealized(p, account.last_price.unwrap_or(p.entry_price))
        });
        account.balance + open
    }

    async fn fill_price(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        let bars = self.market.candles(symbol, &self.timeframe, 1).await?;
        let price = bars
            .iter()
            .max_by_key(|b| b.timestamp)
            .map(|b| b.close)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| BrokerError::InvalidResponse("no price available for paper fill".to_string()))?;
        self.account.lock().last_price = Some(price);
        Ok(price)
    }
}

fn unrealized(position: &PaperPosition, price: Decimal) -> Decimal {
    let diff = price - position.entry_price;
    match position.side {
        PositionSide::Long => diff * position.quantity,
        PositionSide::Short => -diff * position.quantity,
    }
}

impl PaperAccount {
    fn open(
        &mut self,
        order: &OrderRequest,
        price: Decimal,
        leverage: u32,
        commission_rate: Decimal,
    ) -> Result<String, BrokerError> {
        if self.position.is_some() {
            return Err(BrokerError::rejected(
                "position_exists",
                "paper account already holds a position",
            ));
        }

        let notional = price * order.quantity;
        let margin = calculate_required_margin(notional, leverage);
        let fee = notional * commission_rate;
        if margin + fee > self.balance {
            return Err(BrokerError::rejected(
                "insufficient_balance",
                format!(
                    "margin {} + fee {} exceeds free balance {}",
                    margin.round_dp(4),
                    fee.round_dp(4),
                    self.balance.round_dp(4)
                ),
            ));
        }

        self.balance -= margin + fee;
        let side = match order.side {
            OrderSide::Buy => PositionSide::Long,
            OrderSide::Sell => PositionSide::Short,
        };
        self.position = Some(PaperPosition {
            symbol: order.symbol.clone(),
            side,
            quantity: order.quantity,
            entry_price: price,
            margin,
        });

        tracing::info!(
            symbol = %order.symbol,
            side = %side,
            quantity = %order.quantity,
            price = %price,
            fee = %fee.round_dp(6),
            balance = %self.balance.round_dp(4),
            "Paper position opened"
        );
        Ok(self.next_order_id())
    }

    fn reduce(
        &mut self,
        order: &OrderRequest,
        price: Decimal,
        commission_rate: Decimal,
    ) -> Result<String, BrokerError> {
        let Some(position) = self.position.as_mut() else {
            return Err(BrokerError::rejected("no_position", "no position to reduce"));
        };
        if !position.symbol.eq_ignore_ascii_case(&order.symbol)
            || position.side.closing_order_side() != order.side
        {
            return Err(BrokerError::rejected(
                "no_position",
                format!("no {} position to reduce on {}", order.side.opposite(), order.symbol),
            ));
        }

        let quantity = order.quantity.min(position.quantity);
        let share = quantity / position.quantity;
        let released = position.margin * share;
        let pnl = {
            let closed = PaperPosition {
                quantity,
                ..position.clone()
            };
            unrealized(&closed, price)
        };
        let fee = price * quantity * commission_rate;

        position.quantity -= quantity;
        position.margin -= released;
        self.balance += released + pnl - fee;

        tracing::info!(
            symbol = %order.symbol,
            quantity = %quantity,
            price = %price,
            realized_pnl = %pnl.round_dp(6),
            fee = %fee.round_dp(6),
            balance = %self.balance.round_dp(4),
            "Paper position reduced"
        );

        if position.quantity.is_zero() {
            self.position = None;
        }
        Ok(self.next_order_id())
    }

    fn next_order_id(&mut self) -> String {
        self.orders_filled += 1;
        format!("paper-{}", self.orders_filled)
    }
}

#[async_trait]
impl<B: Broker> Broker for PaperBroker<B> {
    async fn positions(&self, symbol: &str) -> Result<Vec<PositionRecord>, BrokerError> {
        let account = self.account.lock();
        Ok(account
            .position
            .iter()
            .filter(|p| p.symbol.eq_ignore_ascii_case(symbol))
            .map(|p| {
                let mark = account.last_price.unwrap_or(p.entry_price);
                let signed_quantity = match p.side {
                    PositionSide::Long => p.quantity,
                    PositionSide::Short => -p.quantity,
                };
                PositionRecord {
                    symbol: p.symbol.clone(),
                    signed_quantity,
                    entry_price: p.entry_price,
                    unrealized_pnl: unrealized(p, mark),
                }
            })
            .collect())
    }

    async fn candles(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, BrokerError> {
        let bars = self.market.candles(symbol, timeframe, limit).await?;
        if let Some(latest) = bars.iter().max_by_key(|b| b.timestamp) {
            self.account.lock().last_price = Some(latest.close);
        }
        Ok(bars)
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        if order.quantity <= Decimal::ZERO {
            return Err(BrokerError::rejected("invalid_size", "order size must be positive"));
        }

        if order.reduce_only && self.account.lock().position.is_none() {
            return Err(BrokerError::rejected("no_position", "no position to reduce"));
        }

        let price = self.fill_price(&order.symbol).await?;

        let mut account = self.account.lock();
        let order_id = if order.reduce_only {
            account.reduce(order, price, self.commission_rate)?
        } else {
            account.open(order, price, self.leverage, self.commission_rate)?
        };

        Ok(OrderAck {
            order_id,
            client_order_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    /// Market-data stub whose latest close can be moved between calls.
    struct StubMarket {
        close: Mutex<Decimal>,
    }

    impl StubMarket {
        fn at(price: Decimal) -> Self {
            Self {
                close: Mutex::new(price),
            }
        }
    }

    #[async_trait]
    impl Broker for StubMarket {
        async fn positions(&self, _symbol: &str) -> Result<Vec<PositionRecord>, BrokerError> {
            Err(BrokerError::Transport("market stub has no account".to_string()))
        }

        async fn candles(&self, _symbol: &str, _timeframe: &str, _limit: usize) -> Result<Vec<Bar>, BrokerError> {
            let close = *self.close.lock();
            Ok(vec![Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: dec!(1),
            }])
        }

        async fn place_market_order(&self, _order: &OrderRequest) -> Result<OrderAck, BrokerError> {
            panic!("paper broker must never route orders to the market broker");
        }
    }

    fn paper(price: Decimal) -> PaperBroker<StubMarket> {
        let config = PaperConfig {
            starting_balance: dec!(100),
            commission_rate: dec!(0.001),
        };
        PaperBroker::new(StubMarket::at(price), &config, "1m", 5)
    }

    #[tokio::test]
    async fn test_open_locks_margin_and_fee() {
        let broker = paper(dec!(50000));
        let order = OrderRequest::open("BTCUSDT", OrderSide::Buy, dec!(0.003));
        let ack = broker.place_market_order(&order).await.unwrap();
        assert_eq!(ack.order_id, "paper-1");

        // notional 150, margin 30, fee 0.15
        assert_eq!(broker.balance(), dec!(69.85));

        let records = broker.positions("BTCUSDT").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].signed_quantity, dec!(0.003));
        assert_eq!(records[0].entry_price, dec!(50000));
    }

    #[tokio::test]
    async fn test_close_realizes_pnl() {
        let broker = paper(dec!(50000));
        broker
            .place_market_order(&OrderRequest::open("BTCUSDT", OrderSide::Sell, dec!(0.002)))
            .await
            .unwrap();

        *broker.market.close.lock() = dec!(49000);
        let records = broker.positions("BTCUSDT").await.unwrap();
        assert_eq!(records[0].signed_quantity, dec!(-0.002));

        broker
            .place_market_order(&OrderRequest::close("BTCUSDT", OrderSide::Buy, dec!(0.002)))
            .await
            .unwrap();

        assert!(broker.positions("BTCUSDT").await.unwrap().is_empty());
        // 100 - 0.1 open fee + 2 profit - 0.098 close fee
        assert_eq!(broker.balance(), dec!(101.802));
    }

    #[tokio::test]
    async fn test_unrealized_pnl_tracks_last_candle() {
        let broker = paper(dec!(50000));
        broker
            .place_market_order(&OrderRequest::open("BTCUSDT", OrderSide::Buy, dec!(0.002)))
            .await
            .unwrap();

        *broker.market.close.lock() = dec!(51000);
        broker.candles("BTCUSDT", "1m", 30).await.unwrap();

        let records = broker.positions("BTCUSDT").await.unwrap();
        assert_eq!(records[0].unrealized_pnl, dec!(2));
    }

    #[tokio::test]
    async fn test_insufficient_balance_is_rejected() {
        let broker = paper(dec!(50000));
        // notional 1000 at 5x needs 200 margin
        let err = broker
            .place_market_order(&OrderRequest::open("BTCUSDT", OrderSide::Buy, dec!(0.02)))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Rejected { ref code, .. } if code == "insufficient_balance"));
        assert_eq!(broker.balance(), dec!(100));
    }

    #[tokio::test]
    async fn test_reduce_only_without_position_is_rejected() {
        let broker = paper(dec!(50000));
        let err = broker
            .place_market_order(&OrderRequest::close("BTCUSDT", OrderSide::Sell, dec!(0.001)))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Rejected { ref code, .. } if code == "no_position"));
    }

    #[tokio::test]
    async fn test_reduce_only_same_side_is_rejected() {
        let broker = paper(dec!(50000));
        broker
            .place_market_order(&OrderRequest::open("BTCUSDT", OrderSide::Buy, dec!(0.001)))
            .await
            .unwrap();
        let err = broker
            .place_market_order(&OrderRequest::close("BTCUSDT", OrderSide::Buy, dec!(0.001)))
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_second_open_is_rejected() {
        let broker = paper(dec!(50000));
        broker
            .place_market_order(&OrderRequest::open("BTCUSDT", OrderSide::Buy, dec!(0.001)))
            .await
            .unwrap();
        let err = broker
            .place_market_order(&OrderRequest::open("BTCUSDT", OrderSide::Buy, dec!(0.001)))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Rejected { ref code, .. } if code == "position_exists"));
    }

    #[tokio::test]
    async fn test_equity_includes_open_position() {
        let broker = paper(dec!(50000));
        broker
            .place_market_order(&OrderRequest::open("BTCUSDT", OrderSide::Buy, dec!(0.002)))
            .await
            .unwrap();
        *broker.market.close.lock() = dec!(50500);
        broker.candles("BTCUSDT", "1m", 1).await.unwrap();
        // 100 - 0.1 fee + 1 unrealized
        assert_eq!(broker.equity(), dec!(100.9));
    }
}
