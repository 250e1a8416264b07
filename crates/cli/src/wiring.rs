//! Builds the broker, oracle, notifier and news source for the configured
//! execution mode.

use anyhow::Context;
use llm_trade_agent::notifier::{TELEGRAM_CHAT_ENV, TELEGRAM_TOKEN_ENV};
use llm_trade_agent::{LogNotifier, NewsApiClient, Notifier, TelegramNotifier, TradingAgent, NEWSAPI_KEY_ENV};
use llm_trade_bitget::{BitgetAuth, BitgetAuthConfig, BitgetClient, BitgetClientConfig, PaperBroker};
use llm_trade_core::{AppConfig, Broker, ExecutionMode};
use llm_trade_oracle::{ChatOracle, API_KEY_ENV};
use std::sync::Arc;

/// Paper mode prices fills from public Bitget candles; live mode sends signed
/// orders. Leverage is pushed to the exchange only when `apply_leverage` is set.
pub async fn build_broker(config: &AppConfig, apply_leverage: bool) -> anyhow::Result<Arc<dyn Broker>> {
    let client_config = BitgetClientConfig::from_settings(&config.bitget, &config.trading);
    let trading = &config.trading;

    match trading.mode {
        ExecutionMode::Paper => {
            let market = BitgetClient::public(client_config)?;
            tracing::info!(
                balance = %config.paper.starting_balance,
                "Paper trading: fills are simulated at the latest Bitget close"
            );
            Ok(Arc::new(PaperBroker::new(
                market,
                &config.paper,
                trading.timeframe.clone(),
                trading.leverage,
            )))
        }
        ExecutionMode::Live => {
            let auth = BitgetAuth::from_env(&BitgetAuthConfig::default())
                .context("Live mode requires Bitget API credentials")?;
            let client = BitgetClient::authenticated(client_config, auth)?;

            if apply_leverage {
                if let Err(e) = client.set_leverage(&trading.symbol, trading.leverage).await {
                    tracing::warn!(
                        error = %e,
                        leverage = trading.leverage,
                        "Failed to set leverage, continuing with the account setting"
                    );
                }
            }
            Ok(Arc::new(client))
        }
    }
}

/// Builds the full agent. Everything that only needs local credentials is
/// built before the broker, so a missing key fails before any exchange call.
pub async fn build_agent(
    config: &AppConfig,
) -> anyhow::Result<TradingAgent<Arc<dyn Broker>, ChatOracle>> {
    let oracle = build_oracle(config)?;
    let notifier = build_notifier(config)?;
    let news = NewsApiClient::from_env(&config.news)?;
    let broker = build_broker(config, true).await?;

    let agent = TradingAgent::new(&config.trading, broker, oracle).with_notifier(notifier);
    Ok(match news {
        Some(news) => {
            tracing::info!(query = %config.news.query, "Headline sentiment enabled");
            agent.with_news(Box::new(news))
        }
        None => agent,
    })
}

pub fn build_oracle(config: &AppConfig) -> anyhow::Result<ChatOracle> {
    ChatOracle::from_env(&config.oracle)
}

/// Telegram when both of its variables are set, the log otherwise.
pub fn build_notifier(config: &AppConfig) -> anyhow::Result<Box<dyn Notifier>> {
    match TelegramNotifier::from_env(&config.notify.telegram_api_url)? {
        Some(telegram) => {
            tracing::info!("Trade notifications go to Telegram");
            Ok(Box::new(telegram))
        }
        None => Ok(Box::new(LogNotifier)),
    }
}

/// A credential environment variable and whether this run needs it.
pub struct Credential {
    pub name: String,
    pub required: bool,
    pub present: bool,
}

/// Every credential variable the agent reads. Values are never returned.
pub fn credentials(config: &AppConfig) -> Vec<Credential> {
    let live = config.trading.mode == ExecutionMode::Live;
    let bitget = BitgetAuthConfig::default();

    [
        (API_KEY_ENV.to_string(), true),
        (bitget.api_key_env, live),
        (bitget.secret_env, live),
        (bitget.passphrase_env, live),
        (TELEGRAM_TOKEN_ENV.to_string(), false),
        (TELEGRAM_CHAT_ENV.to_string(), false),
        (NEWSAPI_KEY_ENV.to_string(), false),
    ]
    .into_iter()
    .map(|(name, required)| {
        let present = std::env::var(&name).is_ok_and(|v| !v.trim().is_empty());
        Credential {
            name,
            required,
            present,
        }
    })
    .collect()
}
