use crate::dispatcher::Dispatch;
use crate::execution::Execution;
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use llm_trade_core::{Decision, OrderResult};
use serde::Serialize;

/// Everything one cycle observed and did. Built by the agent and handed to
/// logging, notification and statistics; never fed back into the next cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub snapshot: Snapshot,
    pub market_available: bool,
    /// `None` when the cycle was skipped before the oracle was consulted.
    pub decision: Option<Decision>,
    pub dispatch: Option<Dispatch>,
    pub execution: Option<Execution>,
}

impl CycleReport {
    #[must_use]
    pub fn skipped(&self) -> bool {
        self.decision.is_none()
    }

    #[must_use]
    pub fn order_submitted(&self) -> bool {
        self.execution.as_ref().is_some_and(|e| e.submitted)
    }

    /// One line for the cycle log.
    #[must_use]
    pub fn summary(&self) -> String {
        let state = match &self.snapshot {
            Snapshot::Known(state) => state.label().to_string(),
            Snapshot::Unknown { cause } => return format!("skipped: position unknown ({cause})"),
        };
        let Some(decision) = &self.decision else {
            return format!("skipped while {state}");
        };

        let action = match (&self.dispatch, &self.execution) {
            (_, Some(execution)) => match &execution.result {
                OrderResult::Accepted { order_id } => format!("order accepted ({order_id})"),
                OrderResult::Rejected { cause } if !execution.submitted => {
                    format!("order not sent: {cause}")
                }
                OrderResult::Rejected { cause } => format!("order rejected: {cause}"),
                OrderResult::TransportError { cause } => format!("order failed: {cause}"),
            },
            (Some(Dispatch::Hold(reason)), None) => format!("hold ({reason})"),
            _ => "no order".to_string(),
        };

        format!(
            "{state} | {} ({}) | {action}",
            decision.action,
            if decision.is_fallback() { "fallback" } else { "oracle" }
        )
    }
}

/// Running counters across the agent's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    pub cycles: u64,
    pub skipped_cycles: u64,
    pub oracle_fallbacks: u64,
    pub holds: u64,
    pub orders_submitted: u64,
    pub orders_accepted: u64,
    pub orders_rejected: u64,
    pub transport_errors: u64,
    /// Orders stopped before submission (sizing, minimum notional).
    pub orders_blocked: u64,
}

impl AgentStats {
    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.skipped() {
            self.skipped_cycles += 1;
            return;
        }
        if report.decision.as_ref().is_some_and(Decision::is_fallback) {
            self.oracle_fallbacks += 1;
        }
        if matches!(report.dispatch, Some(Dispatch::Hold(_))) {
            self.holds += 1;
        }
        if let Some(execution) = &report.execution {
            if !execution.submitted {
                self.orders_blocked += 1;
                return;
            }
            self.orders_submitted += 1;
            match execution.result {
                OrderResult::Accepted { .. } => self.orders_accepted += 1,
                OrderResult::Rejected { .. } => self.orders_rejected += 1,
                OrderResult::TransportError { .. } => self.transport_errors += 1,
            }
        }
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Cycles: {} ({} skipped) | Fallbacks: {} | Holds: {} | Orders: {} accepted / {} submitted ({} rejected, {} failed, {} blocked)",
            self.cycles,
            self.skipped_cycles,
            self.oracle_fallbacks,
            self.holds,
            self.orders_accepted,
            self.orders_submitted,
            self.orders_rejected,
            self.transport_errors,
            self.orders_blocked
        )
    }
}
