pub mod config;
pub mod config_loader;
pub mod decision;
pub mod error;
pub mod indicators;
pub mod market;
pub mod news;
pub mod order;
pub mod position;
pub mod position_sizing;
pub mod request;
pub mod traits;

pub use config::{
    AppConfig, BitgetConfig, ExecutionMode, NewsConfig, NotifyConfig, OracleConfig, PaperConfig, TradingConfig,
    MAX_CANDLE_LIMIT, MAX_CAPITAL,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH, ENV_PREFIX};
pub use decision::{Action, Decision, DecisionSource, RawDecision, NO_REASON};
pub use error::{BrokerError, DecisionRejection, NewsError, OracleError, SnapshotError};
pub use indicators::{rsi, RSI_PERIOD};
pub use market::{Bar, Candles, MarketWindow, MARKET_UNAVAILABLE_MARKER};
pub use news::{score_text, Headline, NewsDigest};
pub use order::{OrderAck, OrderRequest, OrderResult, OrderSide};
pub use position::{Exposure, PositionRecord, PositionSide, PositionState};
pub use position_sizing::{calculate_order_quantity, calculate_required_margin, MAX_LEVERAGE};
pub use request::DecisionRequest;
pub use traits::{Broker, DecisionOracle, HeadlineSource};
