use crate::position_sizing::MAX_LEVERAGE;
use anyhow::{ensure, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Longest candle window the agent ever fetches.
pub const MAX_CANDLE_LIMIT: usize = 30;

/// Largest trading capital accepted, in the margin coin.
pub const MAX_CAPITAL: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub trading: TradingConfig,
    pub bitget: BitgetConfig,
    pub oracle: OracleConfig,
    pub paper: PaperConfig,
    pub notify: NotifyConfig,
    pub news: NewsConfig,
}

/// Trading execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Simulated fills against live market data.
    #[default]
    Paper,
    /// Real orders on the exchange.
    Live,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "paper" => Ok(Self::Paper),
            "live" => Ok(Self::Live),
            _ => Err(format!("Invalid mode '{s}'. Valid options: paper, live")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    pub symbol: String,
    pub product_type: String,
    pub margin_coin: String,
    /// Candle granularity, e.g. `1m`, `15m`, `1H`.
    pub timeframe: String,
    /// Candles fetched per cycle.
    pub candle_limit: usize,
    /// Trailing candles included in the decision request.
    pub prompt_candles: usize,
    pub leverage: u32,
    /// Capital the agent trades with, in the margin coin.
    pub capital: Decimal,
    /// Share of `capital` committed as margin per open.
    pub capital_fraction: Decimal,
    /// Lot precision of the instrument (decimal places).
    pub size_decimals: u32,
    /// Opens below this notional are not submitted.
    pub min_order_notional: Decimal,
    pub poll_interval_secs: u64,
    pub mode: ExecutionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitgetConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub requests_per_second: u32,
    /// Route requests to Bitget demo trading.
    pub demo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f64,
    /// Upper bound on completion tokens per reply.
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    pub starting_balance: Decimal,
    pub commission_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub telegram_api_url: String,
}

/// Headline sentiment. Only consulted when `NEWSAPI_KEY` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    pub api_url: String,
    /// Search terms sent to the headline service.
    pub query: String,
    /// Most recent headlines scored per cycle.
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            trading: TradingConfig {
                symbol: "BTCUSDT".to_string(),
                product_type: "USDT-FUTURES".to_string(),
                margin_coin: "USDT".to_string(),
                timeframe: "1m".to_string(),
                candle_limit: MAX_CANDLE_LIMIT,
                prompt_candles: 15,
                leverage: 5,
                capital: Decimal::from(100),
                capital_fraction: Decimal::new(3, 1),
                size_decimals: 3,
                min_order_notional: Decimal::from(5),
                poll_interval_secs: 60,
                mode: ExecutionMode::Paper,
            },
            bitget: BitgetConfig {
                api_url: "https://api.bitget.com".to_string(),
                timeout_secs: 10,
                requests_per_second: 10,
                demo: false,
            },
            oracle: OracleConfig {
                api_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
                temperature: 0.2,
                max_tokens: 300,
            },
            paper: PaperConfig {
                starting_balance: Decimal::from(100),
                commission_rate: Decimal::new(6, 4),
            },
            notify: NotifyConfig {
                telegram_api_url: "https://api.telegram.org".to_string(),
            },
            news: NewsConfig {
                api_url: "https://newsapi.org/v2".to_string(),
                query: "bitcoin".to_string(),
                page_size: 5,
                timeout_secs: 10,
            },
        }
    }
}

impl AppConfig {
    /// Checks every bound the agent relies on at runtime.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        let t = &self.trading;
        ensure!(!t.symbol.trim().is_empty(), "trading.symbol must not be empty");
        ensure!(!t.timeframe.trim().is_empty(), "trading.timeframe must not be empty");
        ensure!(
            (1..=MAX_LEVERAGE).contains(&t.leverage),
            "trading.leverage must be between 1 and {MAX_LEVERAGE}, got {}",
            t.leverage
        );
        ensure!(t.capital > Decimal::ZERO, "trading.capital must be positive");
        ensure!(
            t.capital <= MAX_CAPITAL,
            "trading.capital must not exceed {MAX_CAPITAL}, got {}",
            t.capital
        );
        ensure!(
            t.capital_fraction > Decimal::ZERO && t.capital_fraction < Decimal::ONE,
            "trading.capital_fraction must be strictly between 0 and 1, got {}",
            t.capital_fraction
        );
        ensure!(
            (1..=MAX_CANDLE_LIMIT).contains(&t.candle_limit),
            "trading.candle_limit must be between 1 and {MAX_CANDLE_LIMIT}, got {}",
            t.candle_limit
        );
        ensure!(
            (1..=t.candle_limit).contains(&t.prompt_candles),
            "trading.prompt_candles must be between 1 and candle_limit ({}), got {}",
            t.candle_limit,
            t.prompt_candles
        );
        ensure!(
            t.min_order_notional >= Decimal::ZERO,
            "trading.min_order_notional must not be negative"
        );
        ensure!(t.poll_interval_secs > 0, "trading.poll_interval_secs must be positive");
        ensure!(self.bitget.timeout_secs > 0, "bitget.timeout_secs must be positive");
        ensure!(
            self.bitget.requests_per_second > 0,
            "bitget.requests_per_second must be positive"
        );
        ensure!(self.oracle.timeout_secs > 0, "oracle.timeout_secs must be positive");
        ensure!(!self.oracle.model.trim().is_empty(), "oracle.model must not be empty");
        ensure!(self.oracle.max_tokens > 0, "oracle.max_tokens must be positive");
        ensure!(
            self.paper.starting_balance > Decimal::ZERO,
            "paper.starting_balance must be positive"
        );
        ensure!(
            self.paper.commission_rate >= Decimal::ZERO,
            "paper.commission_rate must not be negative"
        );
        ensure!(
            (1..=100).contains(&self.news.page_size),
            "news.page_size must be between 1 and 100, got {}",
            self.news.page_size
        );
        ensure!(self.news.timeout_secs > 0, "news.timeout_secs must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_full_balance_fraction_is_rejected() {
        let mut config = AppConfig::default();
        config.trading.capital_fraction = dec!(1);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("capital_fraction"));
    }

    #[test]
    fn test_capital_bounds() {
        let mut config = AppConfig::default();
        config.trading.capital = Decimal::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("trading.capital"));

        config.trading.capital = MAX_CAPITAL;
        assert!(config.validate().is_ok());
        config.trading.capital = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_leverage_bounds() {
        let mut config = AppConfig::default();
        config.trading.leverage = 0;
        assert!(config.validate().is_err());
        config.trading.leverage = 126;
        assert!(config.validate().is_err());
        config.trading.leverage = 125;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_prompt_window_must_fit_fetched_window() {
        let mut config = AppConfig::default();
        config.trading.candle_limit = 10;
        config.trading.prompt_candles = 15;
        assert!(config.validate().is_err());

        config.trading.candle_limit = 31;
        config.trading.prompt_candles = 15;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut config = AppConfig::default();
        config.trading.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_execution_mode_parsing() {
        assert_eq!("PAPER".parse::<ExecutionMode>().unwrap(), ExecutionMode::Paper);
        assert_eq!("live".parse::<ExecutionMode>().unwrap(), ExecutionMode::Live);
        assert!("backtest".parse::<ExecutionMode>().is_err());
    }
}
