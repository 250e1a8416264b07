//! Bitget USDT-margined futures integration for the trading agent.
//!
//! This crate provides:
//! - REST client with rate limiting for the Bitget v2 mix API
//! - HMAC-SHA256 request signing
//! - A [`Broker`](llm_trade_core::Broker) implementation for live trading
//! - A paper broker that fills locally against live candles
//!
//! # Example
//!
//! ```ignore
//! use llm_trade_bitget::{BitgetAuth, BitgetAuthConfig, BitgetClient, BitgetClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = BitgetAuth::from_env(&BitgetAuthConfig::default())?;
//!     let client = BitgetClient::authenticated(BitgetClientConfig::default(), auth)?;
//!
//!     let positions = client.get_positions("BTCUSDT").await?;
//!     println!("{} open position records", positions.len());
//!     Ok(())
//! }
//! ```
//!
//! # Authentication
//!
//! Set the following environment variables for live trading:
//!
//! - `BITGET_API_KEY`
//! - `BITGET_API_SECRET`
//! - `BITGET_API_PASSPHRASE`
//!
//! Paper trading needs none of them; candles come from public endpoints.

pub mod auth;
mod broker;
pub mod client;
pub mod error;
pub mod paper;
pub mod types;

pub use auth::{BitgetAuth, BitgetAuthConfig, SignedHeaders};
pub use client::{BitgetClient, BitgetClientConfig, BITGET_API_URL};
pub use error::{BitgetError, Result};
pub use paper::PaperBroker;
