use crate::decision::RawDecision;
use crate::error::{BrokerError, NewsError, OracleError};
use crate::market::Bar;
use crate::news::Headline;
use crate::order::{OrderAck, OrderRequest};
use crate::position::PositionRecord;
use crate::request::DecisionRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// The broker: authoritative position ledger, market data and order entry.
#[async_trait]
pub trait Broker: Send + Sync {
    /// All position records the broker holds for `symbol`.
    async fn positions(&self, symbol: &str) -> Result<Vec<PositionRecord>, BrokerError>;

    /// The most recent `limit` candles at `timeframe`.
    async fn candles(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, BrokerError>;

    /// Submits one market order.
    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError>;
}

/// The external reasoning service. Replies are returned unvalidated.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn consult(&self, request: &DecisionRequest) -> Result<RawDecision, OracleError>;
}

/// Recent headlines about the traded instrument, newest first.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn headlines(&self) -> Result<Vec<Headline>, NewsError>;
}

#[async_trait]
impl<T: Broker + ?Sized> Broker for Arc<T> {
    async fn positions(&self, symbol: &str) -> Result<Vec<PositionRecord>, BrokerError> {
        (**self).positions(symbol).await
    }

    async fn candles(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, BrokerError> {
        (**self).candles(symbol, timeframe, limit).await
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        (**self).place_market_order(order).await
    }
}

#[async_trait]
impl<T: DecisionOracle + ?Sized> DecisionOracle for Arc<T> {
    async fn consult(&self, request: &DecisionRequest) -> Result<RawDecision, OracleError> {
        (**self).consult(request).await
    }
}
