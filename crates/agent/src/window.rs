use llm_trade_core::{Broker, MarketWindow};

/// Fetches the trailing `limit` candles. Failure degrades to
/// [`MarketWindow::Unavailable`] instead of ending the cycle.
pub async fn fetch_window<B: Broker + ?Sized>(
    broker: &B,
    symbol: &str,
    timeframe: &str,
    limit: usize,
) -> MarketWindow {
    match broker.candles(symbol, timeframe, limit).await {
        Ok(bars) => {
            let window = MarketWindow::from_bars(bars, limit);
            if let MarketWindow::Unavailable { cause } = &window {
                tracing::warn!(symbol, timeframe, cause = %cause, "Market window empty");
            }
            window
        }
        Err(e) => {
            tracing::warn!(symbol, timeframe, error = %e, "Market data fetch failed");
            MarketWindow::unavailable(e.to_string())
        }
    }
}
