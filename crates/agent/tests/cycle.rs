mod common;

use common::{trading_config, MockBroker, RecordingNotifier, ScriptedOracle, StaticHeadlines, SYMBOL};
use llm_trade_agent::{Dispatch, HoldReason, Snapshot, TradingAgent};
use llm_trade_core::{
    Action, BrokerError, NewsError, OracleError, OrderResult, OrderSide, PositionRecord, MARKET_UNAVAILABLE_MARKER,
};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

fn agent(broker: &Arc<MockBroker>, oracle: &Arc<ScriptedOracle>) -> TradingAgent<Arc<MockBroker>, Arc<ScriptedOracle>> {
    TradingAgent::new(&trading_config(), Arc::clone(broker), Arc::clone(oracle))
}

fn reply(action: &str) -> serde_json::Value {
    json!({"action": action, "reason": "test"})
}

#[tokio::test]
async fn test_flat_sell_opens_short_sized_from_capital() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("SELL")));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    let orders = broker.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].symbol, SYMBOL);
    assert_eq!(orders[0].side, OrderSide::Sell);
    assert_eq!(orders[0].quantity, dec!(0.003));
    assert!(!orders[0].reduce_only);
    assert!(report.order_submitted());
    assert_eq!(agent.stats().orders_accepted, 1);
}

#[tokio::test]
async fn test_exposed_long_close_sells_exact_quantity() {
    let broker = Arc::new(MockBroker::holding(dec!(0.05), dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("CLOSE")));
    let mut agent = agent(&broker, &oracle);

    agent.run_cycle().await;

    let orders = broker.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, OrderSide::Sell);
    assert_eq!(orders[0].quantity, dec!(0.05));
    assert!(orders[0].reduce_only);
}

#[tokio::test]
async fn test_close_without_reason_is_still_executed() {
    let broker = Arc::new(MockBroker::holding(dec!(0.05), dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(json!({"action": "CLOSE"})));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert!(report.decision.as_ref().is_some_and(|d| !d.is_fallback()));
    let orders = broker.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].quantity, dec!(0.05));
}

#[tokio::test]
async fn test_exposed_short_close_buys_back() {
    let broker = Arc::new(MockBroker::holding(dec!(-0.02), dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("CLOSE")));
    let mut agent = agent(&broker, &oracle);

    agent.run_cycle().await;

    let orders = broker.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[0].quantity, dec!(0.02));
}

#[tokio::test]
async fn test_flat_close_places_nothing() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("CLOSE")));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert!(broker.orders().is_empty());
    let decision = report.decision.expect("oracle was consulted");
    assert!(decision.is_fallback());
    assert_eq!(decision.action, Action::Wait);
}

#[tokio::test]
async fn test_exposed_open_is_never_stacked() {
    let broker = Arc::new(MockBroker::holding(dec!(-0.01), dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("BUY")));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert!(broker.orders().is_empty());
    assert!(report.decision.as_ref().is_some_and(|d| d.is_fallback()));
    assert_eq!(report.dispatch, Some(Dispatch::Hold(HoldReason::Wait)));
}

#[tokio::test]
async fn test_unknown_token_falls_back_to_wait() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("HOLD")));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert!(broker.orders().is_empty());
    let decision = report.decision.expect("oracle was consulted");
    assert!(decision.reason.contains("HOLD"));
    assert_eq!(agent.stats().oracle_fallbacks, 1);
}

#[tokio::test]
async fn test_oracle_failure_falls_back_to_wait() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::failing(OracleError::Timeout(
        "deadline elapsed".to_string(),
    )));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert_eq!(oracle.calls(), 1);
    assert!(broker.orders().is_empty());
    assert!(report.decision.as_ref().is_some_and(|d| d.is_fallback()));
    assert!(!report.skipped());
}

#[tokio::test]
async fn test_repeated_wait_places_no_orders() {
    let broker = Arc::new(MockBroker::holding(dec!(0.01), dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("WAIT")));
    let mut agent = agent(&broker, &oracle);

    agent.run_cycle().await;
    agent.run_cycle().await;

    assert!(broker.orders().is_empty());
    assert_eq!(oracle.calls(), 2);
    assert_eq!(agent.stats().holds, 2);
    assert_eq!(agent.stats().oracle_fallbacks, 0);
}

#[tokio::test]
async fn test_position_failure_skips_cycle_without_oracle() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    *broker.positions.lock() = Err(BrokerError::Transport("connection reset".to_string()));
    let oracle = Arc::new(ScriptedOracle::replying(reply("BUY")));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert!(report.skipped());
    assert!(matches!(report.snapshot, Snapshot::Unknown { .. }));
    assert_eq!(oracle.calls(), 0);
    assert!(broker.orders().is_empty());
}

#[tokio::test]
async fn test_multiple_open_records_skip_cycle() {
    let broker = Arc::new(MockBroker::holding(dec!(0.01), dec!(50000)));
    broker
        .positions
        .lock()
        .as_mut()
        .expect("positions are set")
        .push(PositionRecord {
            symbol: SYMBOL.to_string(),
            signed_quantity: dec!(-0.02),
            entry_price: dec!(49000),
            unrealized_pnl: dec!(0),
        });
    let oracle = Arc::new(ScriptedOracle::replying(reply("CLOSE")));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert!(report.skipped());
    assert_eq!(oracle.calls(), 0);
    assert!(broker.orders().is_empty());
}

#[tokio::test]
async fn test_market_failure_still_consults_oracle_but_holds() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    *broker.candles.lock() = Err(BrokerError::Transport("timeout".to_string()));
    let oracle = Arc::new(ScriptedOracle::replying(reply("BUY")));
    let mut agent = agent(&broker, &oracle);

    let report = agent.run_cycle().await;

    assert_eq!(oracle.calls(), 1);
    let request = oracle.requests.lock()[0].clone();
    assert!(!request.market_available);
    assert!(request.market_text.contains(MARKET_UNAVAILABLE_MARKER));
    assert!(broker.orders().is_empty());
    assert!(!report.market_available);
    assert_eq!(report.dispatch, Some(Dispatch::Hold(HoldReason::MarketUnavailable)));
}

#[tokio::test]
async fn test_request_reflects_position_state() {
    let broker = Arc::new(MockBroker::holding(dec!(0.05), dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("WAIT")));
    let mut agent = agent(&broker, &oracle);

    agent.run_cycle().await;

    let request = oracle.requests.lock()[0].clone();
    assert_eq!(request.symbol, SYMBOL);
    assert_eq!(request.allowed_actions, vec![Action::Close, Action::Wait]);
    assert!(request.position_status.starts_with("LONG"));
    assert!(request.market_available);
}

#[tokio::test]
async fn test_request_carries_rsi_of_fetched_window() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("WAIT")));
    let mut agent = agent(&broker, &oracle);

    agent.run_cycle().await;

    // closes rise by one every bar
    let request = oracle.requests.lock()[0].clone();
    assert_eq!(request.rsi, Some(dec!(100)));
    assert!(request.market_text.contains("RSI(14) over the last 30 closes: 100"));
    assert_eq!(request.news_text, "News: no recent headlines.");
}

#[tokio::test]
async fn test_headlines_reach_the_oracle() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("WAIT")));
    let mut agent = agent(&broker, &oracle)
        .with_news(Box::new(StaticHeadlines::one("Bitcoin surges past resistance")));

    agent.run_cycle().await;

    let request = oracle.requests.lock()[0].clone();
    assert!(request.news_text.starts_with("News sentiment over 1 headlines"));
    assert!(request.news_text.contains("- Bitcoin surges past resistance"));
}

#[tokio::test]
async fn test_news_failure_does_not_block_the_cycle() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("BUY")));
    let mut agent = agent(&broker, &oracle).with_news(Box::new(StaticHeadlines(Err(
        NewsError::Transport("dns failure".to_string()),
    ))));

    let report = agent.run_cycle().await;

    let request = oracle.requests.lock()[0].clone();
    assert_eq!(request.news_text, "News: no recent headlines.");
    assert!(report.order_submitted());
}

#[tokio::test]
async fn test_rejection_is_contained_and_next_cycle_runs() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    *broker.order_reply.lock() = Err(BrokerError::rejected("40762", "insufficient balance"));
    let oracle = Arc::new(ScriptedOracle::replying(reply("BUY")));
    let mut agent = agent(&broker, &oracle);

    let first = agent.run_cycle().await;
    let execution = first.execution.expect("order was dispatched");
    assert!(matches!(execution.result, OrderResult::Rejected { .. }));

    *broker.order_reply.lock() = Err(BrokerError::Transport("connection reset".to_string()));
    let second = agent.run_cycle().await;
    let execution = second.execution.expect("order was dispatched");
    assert!(matches!(execution.result, OrderResult::TransportError { .. }));

    // each cycle submits exactly once; nothing is retried
    assert_eq!(broker.orders().len(), 2);
    assert_eq!(agent.stats().orders_rejected, 1);
    assert_eq!(agent.stats().transport_errors, 1);
    assert_eq!(oracle.calls(), 2);
}

#[tokio::test]
async fn test_below_minimum_notional_is_blocked_locally() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("BUY")));
    let mut config = trading_config();
    config.capital = dec!(1);
    let mut agent = TradingAgent::new(&config, Arc::clone(&broker), Arc::clone(&oracle));

    let report = agent.run_cycle().await;

    assert!(broker.orders().is_empty());
    assert!(!report.order_submitted());
    assert_eq!(agent.stats().orders_blocked, 1);
}

#[tokio::test]
async fn test_accepted_order_is_notified() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("BUY")));
    let notifier = RecordingNotifier::default();
    let mut agent = agent(&broker, &oracle).with_notifier(Box::new(notifier.clone()));

    agent.run_cycle().await;

    let messages = notifier.messages.lock().clone();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("OPEN LONG"));
    assert!(messages[0].contains("accepted"));
}

#[tokio::test]
async fn test_hold_is_not_notified() {
    let broker = Arc::new(MockBroker::flat_at(dec!(50000)));
    let oracle = Arc::new(ScriptedOracle::replying(reply("WAIT")));
    let notifier = RecordingNotifier::default();
    let mut agent = agent(&broker, &oracle).with_notifier(Box::new(notifier.clone()));

    agent.run_cycle().await;

    assert!(notifier.messages.lock().is_empty());
}
