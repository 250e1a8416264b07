//! Wire types for the Bitget v2 mix (USDT-margined futures) API.
//!
//! Bitget encodes every number as a string, so raw types keep `String`
//! fields and convert into domain types with explicit parsing.

use crate::error::{BitgetError, Result, SUCCESS_CODE};
use chrono::{DateTime, TimeZone, Utc};
use llm_trade_core::{Bar, PositionRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Envelope
// =============================================================================

/// Every Bitget response: `{"code": "00000", "msg": "success", "data": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload of a successful envelope.
    ///
    /// # Errors
    /// Non-success codes are classified by [`BitgetError::from_code`]; a
    /// success envelope without data is an invalid response.
    pub fn into_data(self) -> Result<T> {
        if self.code != SUCCESS_CODE {
            return Err(BitgetError::from_code(self.code, self.msg));
        }
        self.data
            .ok_or_else(|| BitgetError::InvalidResponse("success envelope without data".to_string()))
    }
}

/// Envelope read only for its code and message (error bodies).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    #[serde(default)]
    pub msg: String,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| BitgetError::InvalidResponse(format!("{field}: '{value}' is not a number ({e})")))
}

// =============================================================================
// Positions
// =============================================================================

/// One entry of `GET /api/v2/mix/position/single-position`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPosition {
    pub symbol: String,
    /// `long` or `short`.
    pub hold_side: String,
    /// Total position size in base coin.
    pub total: String,
    #[serde(default)]
    pub open_price_avg: Option<String>,
    #[serde(default, rename = "unrealizedPL")]
    pub unrealized_pl: Option<String>,
}

impl TryFrom<RawPosition> for PositionRecord {
    type Error = BitgetError;

    fn try_from(raw: RawPosition) -> Result<Self> {
        let total = parse_decimal("total", &raw.total)?.abs();
        let signed_quantity = match raw.hold_side.to_ascii_lowercase().as_str() {
            "long" => total,
            "short" => -total,
            other => {
                return Err(BitgetError::InvalidResponse(format!(
                    "unknown holdSide '{other}'"
                )))
            }
        };
        let optional = |field: &str, value: Option<&str>| match value {
            Some(v) if !v.trim().is_empty() => parse_decimal(field, v),
            _ => Ok(Decimal::ZERO),
        };

        Ok(Self {
            symbol: raw.symbol,
            signed_quantity,
            entry_price: optional("openPriceAvg", raw.open_price_avg.as_deref())?,
            unrealized_pnl: optional("unrealizedPL", raw.unrealized_pl.as_deref())?,
        })
    }
}

// =============================================================================
// Candles
// =============================================================================

/// One row of `GET /api/v2/mix/market/candles`:
/// `[ts_ms, open, high, low, close, base_volume, quote_volume]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RawCandle(pub Vec<String>);

impl TryFrom<RawCandle> for Bar {
    type Error = BitgetError;

    fn try_from(raw: RawCandle) -> Result<Self> {
        let row = raw.0;
        if row.len() < 6 {
            return Err(BitgetError::InvalidResponse(format!(
                "candle row has {} fields, expected at least 6",
                row.len()
            )));
        }

        let millis: i64 = row[0]
            .trim()
            .parse()
            .map_err(|_| BitgetError::InvalidResponse(format!("bad candle timestamp '{}'", row[0])))?;
        let timestamp: DateTime<Utc> = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| BitgetError::InvalidResponse(format!("candle timestamp out of range: {millis}")))?;

        Ok(Self {
            timestamp,
            open: parse_decimal("open", &row[1])?,
            high: parse_decimal("high", &row[2])?,
            low: parse_decimal("low", &row[3])?,
            close: parse_decimal("close", &row[4])?,
            volume: parse_decimal("volume", &row[5])?,
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /api/v2/mix/order/place-order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderBody {
    pub symbol: String,
    pub product_type: String,
    pub margin_mode: String,
    pub margin_coin: String,
    pub size: String,
    /// `buy` or `sell`.
    pub side: String,
    pub order_type: String,
    /// `YES` or `NO`; only honoured in one-way position mode.
    pub reduce_only: String,
    pub client_oid: String,
}

/// Payload of a successful place-order response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderData {
    pub order_id: String,
    #[serde(default)]
    pub client_oid: Option<String>,
}

/// Body of `POST /api/v2/mix/account/set-leverage`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLeverageBody {
    pub symbol: String,
    pub product_type: String,
    pub margin_coin: String,
    pub leverage: String,
}
