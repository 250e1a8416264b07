use crate::client::BitgetClient;
use async_trait::async_trait;
use llm_trade_core::{Bar, Broker, BrokerError, OrderAck, OrderRequest, PositionRecord};

#[async_trait]
impl Broker for BitgetClient {
    async fn positions(&self, symbol: &str) -> Result<Vec<PositionRecord>, BrokerError> {
        Ok(self.get_positions(symbol).await?)
    }

    async fn candles(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Bar>, BrokerError> {
        Ok(self.get_candles(symbol, timeframe, limit).await?)
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        Ok(self.place_order(order).await?)
    }
}
