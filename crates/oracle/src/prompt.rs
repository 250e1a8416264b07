//! Message rendering and the response schema sent with every request.

use llm_trade_core::{Action, DecisionRequest};
use serde_json::{json, Value};

/// Name under which the response schema is registered.
pub const SCHEMA_NAME: &str = "trading_decision";

/// JSON schema constraining the reply to `{action, reason}`.
///
/// The enum always lists the full vocabulary; state legality is enforced
/// after the reply comes back.
#[must_use]
pub fn response_schema() -> Value {
    let tokens: Vec<&str> = Action::ALL.iter().map(|a| a.token()).collect();
    json!({
        "type": "object",
        "properties": {
            "action": {
                "type": "string",
                "enum": tokens,
            },
            "reason": {
                "type": "string",
                "description": "One or two sentences explaining the decision.",
            },
        },
        "required": ["action", "reason"],
        "additionalProperties": false,
    })
}

fn describe(action: Action) -> &'static str {
    match action {
        Action::OpenLong => "open a long position",
        Action::OpenShort => "open a short position",
        Action::Close => "close the current position",
        Action::Wait => "do nothing this cycle",
    }
}

/// System instruction. The action vocabulary depends on the position state.
#[must_use]
pub fn system_message(request: &DecisionRequest) -> String {
    let mut text = format!(
        "You are a trading agent for the {} perpetual futures contract. \
         Each cycle you choose exactly one action.\n\nAllowed actions right now:\n",
        request.symbol
    );
    for action in &request.allowed_actions {
        text.push_str(&format!("- {}: {}\n", action.token(), describe(*action)));
    }
    text.push_str(&format!(
        "\nAny other action is invalid and will be ignored. \
         Reply with JSON only: {{\"action\": one of [{}], \"reason\": short explanation}}.",
        request.allowed_tokens()
    ));
    if !request.market_available {
        text.push_str(" Market data is unavailable this cycle; prefer WAIT.");
    }
    text
}

/// User message: position status, the market window, then headline sentiment.
#[must_use]
pub fn user_message(request: &DecisionRequest) -> String {
    format!(
        "Instrument: {}\nTimeframe: {}\nPosition: {}\n\n{}\n{}",
        request.symbol,
        request.timeframe,
        request.position_status,
        request.market_text,
        request.news_text
    )
}
