use crate::dispatcher::{dispatch, Dispatch};
use crate::execution::{Execution, OrderExecutor};
use crate::news::fetch_digest;
use crate::notifier::{LogNotifier, Notifier};
use crate::report::{AgentStats, CycleReport};
use crate::snapshot::fetch_snapshot;
use crate::window::fetch_window;
use chrono::Utc;
use llm_trade_core::{
    Broker, Decision, DecisionOracle, DecisionRequest, HeadlineSource, MarketWindow, NewsDigest,
    OrderResult, PositionState, TradingConfig,
};
use std::time::Duration;
use tokio::sync::watch;

/// The polling decision loop.
///
/// Each cycle re-reads the position from the broker, fetches the market
/// window, asks the oracle for a decision, and issues at most one market
/// order. Nothing learned in one cycle is trusted in the next; the broker's
/// position ledger is the only state that carries over.
pub struct TradingAgent<B, O> {
    broker: B,
    oracle: O,
    notifier: Box<dyn Notifier>,
    news: Option<Box<dyn HeadlineSource>>,
    executor: OrderExecutor,
    symbol: String,
    timeframe: String,
    candle_limit: usize,
    prompt_candles: usize,
    poll_interval: Duration,
    cycle: u64,
    stats: AgentStats,
}

impl<B: Broker, O: DecisionOracle> TradingAgent<B, O> {
    #[must_use]
    pub fn new(config: &TradingConfig, broker: B, oracle: O) -> Self {
        Self {
            broker,
            oracle,
            notifier: Box::new(LogNotifier),
            news: None,
            executor: OrderExecutor::new(config),
            symbol: config.symbol.clone(),
            timeframe: config.timeframe.clone(),
            candle_limit: config.candle_limit,
            prompt_candles: config.prompt_candles,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            cycle: 0,
            stats: AgentStats::default(),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Adds headline sentiment to every decision request.
    #[must_use]
    pub fn with_news(mut self, source: Box<dyn HeadlineSource>) -> Self {
        self.news = Some(source);
        self
    }

    /// Overrides the sleep between cycles.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn broker(&self) -> &B {
        &self.broker
    }

    #[must_use]
    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Consults the oracle and validates its reply against `state`.
    ///
    /// Any failure (transport, timeout, malformed or illegal reply) becomes a
    /// fallback `WAIT`; the oracle is never retried within a cycle.
    pub async fn decide(&self, request: &DecisionRequest, state: &PositionState) -> Decision {
        let raw = match self.oracle.consult(request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Oracle call failed, waiting this cycle");
                return Decision::fallback_wait(e.to_string());
            }
        };

        match Decision::validate(&raw, state) {
            Ok(decision) => {
                tracing::info!(
                    action = %decision.action,
                    reason = %decision.reason,
                    "Oracle decision"
                );
                decision
            }
            Err(rejection) => {
                tracing::warn!(
                    reply = %raw.value(),
                    rejection = %rejection,
                    "Oracle reply rejected, waiting this cycle"
                );
                Decision::fallback_wait(rejection.to_string())
            }
        }
    }

    /// Runs one fetch, decide, dispatch cycle. Never fails; every error is
    /// contained in the returned report.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let started_at = Utc::now();

        let snapshot = fetch_snapshot(&self.broker, &self.symbol).await;
        let Some(state) = snapshot.state().cloned() else {
            return self.finish(CycleReport {
                cycle: self.cycle,
                started_at,
                snapshot,
                market_available: false,
                decision: None,
                dispatch: None,
                execution: None,
            });
        };

        let window = fetch_window(&self.broker, &self.symbol, &self.timeframe, self.candle_limit).await;
        let news = match &self.news {
            Some(source) => fetch_digest(source.as_ref()).await,
            None => NewsDigest::default(),
        };
        let request = DecisionRequest::build(
            &self.symbol,
            &self.timeframe,
            &state,
            &window,
            self.prompt_candles,
        )
        .with_news(&news);

        let decision = self.decide(&request, &state).await;
        let planned = dispatch(&state, &decision, &window);
        let execution = self.executor.execute(&self.broker, &planned, &window).await;

        if let Some(execution) = &execution {
            self.notify_execution(&decision, &planned, execution, &window)
                .await;
        }

        self.finish(CycleReport {
            cycle: self.cycle,
            started_at,
            snapshot,
            market_available: window.is_available(),
            decision: Some(decision),
            dispatch: Some(planned),
            execution,
        })
    }

    fn finish(&mut self, report: CycleReport) -> CycleReport {
        self.stats.record(&report);
        tracing::info!(cycle = report.cycle, "{}", report.summary());
        report
    }

    async fn notify_execution(
        &self,
        decision: &Decision,
        planned: &Dispatch,
        execution: &Execution,
        window: &MarketWindow,
    ) {
        if !execution.submitted {
            return;
        }
        let what = match planned {
            Dispatch::Open { side } => format!("OPEN {side}"),
            Dispatch::Close { position_side, .. } => format!("CLOSE {position_side}"),
            Dispatch::Hold(_) => return,
        };
        let quantity = execution
            .order
            .as_ref()
            .map(|o| o.quantity.normalize().to_string())
            .unwrap_or_default();
        let price = window
            .last_close()
            .map(|p| format!(" @ ~{}", p.normalize()))
            .unwrap_or_default();
        let outcome = match &execution.result {
            OrderResult::Accepted { order_id } => format!("accepted (order {order_id})"),
            OrderResult::Rejected { cause } => format!("rejected: {cause}"),
            OrderResult::TransportError { cause } => format!("failed: {cause}"),
        };

        self.notifier
            .notify(&format!(
                "{what} {} qty {quantity}{price}\n{outcome}\nReason: {}",
                self.symbol, decision.reason
            ))
            .await;
    }

    /// Runs cycles until `shutdown` turns true (or its sender is dropped).
    ///
    /// The signal is observed between cycles and during the sleep; a cycle in
    /// progress always runs to completion.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> AgentStats {
        tracing::info!(
            symbol = %self.symbol,
            timeframe = %self.timeframe,
            interval_secs = self.poll_interval.as_secs(),
            "Trading agent started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.run_cycle().await;

            let interval = self.poll_interval;
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = shutdown.wait_for(|stop| *stop) => break,
            }
        }

        tracing::info!("Trading agent stopped. {}", self.stats.summary());
        self.stats
    }
}
