//! Decision oracle for the trading agent.
//!
//! [`ChatOracle`] renders a [`DecisionRequest`](llm_trade_core::DecisionRequest)
//! into system and user messages, sends them to an OpenAI-compatible
//! chat-completions endpoint under a strict `{action, reason}` JSON schema,
//! and hands back the parsed but unvalidated reply.
//!
//! Set `ORACLE_API_KEY` before calling [`ChatOracle::from_env`].

pub mod client;
pub mod prompt;

pub use client::{ChatOracle, API_KEY_ENV};
