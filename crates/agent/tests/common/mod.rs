#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use llm_trade_agent::Notifier;
use llm_trade_core::{
    AppConfig, Bar, Broker, BrokerError, DecisionOracle, DecisionRequest, Headline, HeadlineSource,
    NewsError, OracleError, OrderAck, OrderRequest, PositionRecord, RawDecision, TradingConfig,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

pub const SYMBOL: &str = "BTCUSDT";

pub fn trading_config() -> TradingConfig {
    AppConfig::default().trading
}

/// In-memory broker whose ledger, candles and order replies are set by the test.
pub struct MockBroker {
    pub positions: Mutex<Result<Vec<PositionRecord>, BrokerError>>,
    pub candles: Mutex<Result<Vec<Bar>, BrokerError>>,
    pub order_reply: Mutex<Result<OrderAck, BrokerError>>,
    pub orders: Mutex<Vec<OrderRequest>>,
}

impl MockBroker {
    pub fn flat_at(price: Decimal) -> Self {
        Self {
            positions: Mutex::new(Ok(Vec::new())),
            candles: Mutex::new(Ok(bars_at(price, 30))),
            order_reply: Mutex::new(Ok(OrderAck {
                order_id: "order-1".to_string(),
                client_order_id: None,
            })),
            orders: Mutex::new(Vec::new()),
        }
    }

    pub fn holding(signed_quantity: Decimal, price: Decimal) -> Self {
        let broker = Self::flat_at(price);
        *broker.positions.lock() = Ok(vec![PositionRecord {
            symbol: SYMBOL.to_string(),
            signed_quantity,
            entry_price: price,
            unrealized_pnl: Decimal::ZERO,
        }]);
        broker
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().clone()
    }
}

#[async_trait]
impl Broker for MockBroker {
    async fn positions(&self, _symbol: &str) -> Result<Vec<PositionRecord>, BrokerError> {
        self.positions.lock().clone()
    }

    async fn candles(&self, _symbol: &str, _timeframe: &str, _limit: usize) -> Result<Vec<Bar>, BrokerError> {
        self.candles.lock().clone()
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        self.orders.lock().push(order.clone());
        self.order_reply.lock().clone()
    }
}

/// `count` one-minute candles, the last closing at `price`.
pub fn bars_at(price: Decimal, count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let close = price - Decimal::from(count - 1 - i);
            Bar {
                timestamp: Utc
                    .timestamp_opt(1_700_000_000 + 60 * i as i64, 0)
                    .unwrap(),
                open: close,
                high: close + Decimal::ONE,
                low: close - Decimal::ONE,
                close,
                volume: Decimal::TEN,
            }
        })
        .collect()
}

/// Oracle that returns the same scripted reply every time and records requests.
pub struct ScriptedOracle {
    reply: Result<serde_json::Value, OracleError>,
    pub requests: Mutex<Vec<DecisionRequest>>,
}

impl ScriptedOracle {
    pub fn replying(value: serde_json::Value) -> Self {
        Self {
            reply: Ok(value),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: OracleError) -> Self {
        Self {
            reply: Err(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn consult(&self, request: &DecisionRequest) -> Result<RawDecision, OracleError> {
        self.requests.lock().push(request.clone());
        self.reply.clone().map(RawDecision::new)
    }
}

/// Notifier that keeps every message.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Headline source with a fixed answer.
pub struct StaticHeadlines(pub Result<Vec<Headline>, NewsError>);

impl StaticHeadlines {
    pub fn one(title: &str) -> Self {
        Self(Ok(vec![Headline {
            title: title.to_string(),
            description: String::new(),
            published_at: Utc::now() - chrono::Duration::hours(1),
        }]))
    }
}

#[async_trait]
impl HeadlineSource for StaticHeadlines {
    async fn headlines(&self) -> Result<Vec<Headline>, NewsError> {
        self.0.clone()
    }
}
