use crate::decision::Action;
use crate::market::MarketWindow;
use crate::news::NewsDigest;
use crate::position::PositionState;
use rust_decimal::Decimal;
use serde::Serialize;

/// Everything the oracle is given for one cycle. Built fresh each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionRequest {
    pub symbol: String,
    pub timeframe: String,
    /// Position rendered for humans, e.g. `FLAT: no open position on BTCUSDT`.
    pub position_status: String,
    /// Actions legal in the current position state.
    pub allowed_actions: Vec<Action>,
    /// Trailing candles as text, or the unavailable marker.
    pub market_text: String,
    pub market_available: bool,
    /// RSI(14) over the fetched window, absent when it is too short.
    pub rsi: Option<Decimal>,
    /// Headline sentiment, or a no-news line.
    pub news_text: String,
}

impl DecisionRequest {
    #[must_use]
    pub fn build(
        symbol: &str,
        timeframe: &str,
        state: &PositionState,
        window: &MarketWindow,
        prompt_candles: usize,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            position_status: state.status_line(symbol),
            allowed_actions: state.allowed_actions().to_vec(),
            market_text: window.render(timeframe, prompt_candles),
            market_available: window.is_available(),
            rsi: window.rsi(),
            news_text: NewsDigest::default().render(),
        }
    }

    #[must_use]
    pub fn with_news(mut self, digest: &NewsDigest) -> Self {
        self.news_text = digest.render();
        self
    }

    /// Allowed tokens joined for display, e.g. `BUY, SELL, WAIT`.
    #[must_use]
    pub fn allowed_tokens(&self) -> String {
        self.allowed_actions
            .iter()
            .map(|a| a.token())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
