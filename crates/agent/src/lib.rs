//! The trading agent: position reconciliation, headline sentiment, oracle
//! consultation, action dispatch and order execution, run as a sequential
//! polling loop.
//!
//! # Example
//!
//! ```ignore
//! use llm_trade_agent::TradingAgent;
//!
//! let agent = TradingAgent::new(&config.trading, broker, oracle);
//! let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
//! let stats = agent.run(stop_rx).await;
//! ```

pub mod agent;
pub mod dispatcher;
pub mod execution;
pub mod news;
pub mod notifier;
pub mod report;
pub mod snapshot;
pub mod window;

pub use agent::TradingAgent;
pub use dispatcher::{dispatch, Dispatch, HoldReason};
pub use execution::{Execution, OrderExecutor};
pub use news::{fetch_digest, NewsApiClient, NEWSAPI_KEY_ENV};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use report::{AgentStats, CycleReport};
pub use snapshot::{fetch_snapshot, Snapshot};
pub use window::fetch_window;
