//! Bitget REST client for USDT-margined futures, with rate limiting.
//!
//! Market data endpoints are public and work without credentials; position
//! and order endpoints need a [`BitgetAuth`].
//!
//! # Example
//!
//! ```ignore
//! use llm_trade_bitget::{BitgetClient, BitgetClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BitgetClient::public(BitgetClientConfig::default())?;
//!     let bars = client.get_candles("BTCUSDT", "1m", 30).await?;
//!     println!("last close: {:?}", bars.last().map(|b| b.close));
//!     Ok(())
//! }
//! ```

use crate::auth::BitgetAuth;
use crate::error::{BitgetError, Result};
use crate::types::{
    Envelope, ErrorEnvelope, PlaceOrderBody, PlaceOrderData, RawCandle, RawPosition,
    SetLeverageBody,
};
use governor::{Quota, RateLimiter};
use llm_trade_core::{Bar, BitgetConfig, OrderAck, OrderRequest, PositionRecord, TradingConfig};
use nonzero_ext::nonzero;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;

// =============================================================================
// Constants
// =============================================================================

/// Bitget production API base URL.
pub const BITGET_API_URL: &str = "https://api.bitget.com";

const POSITION_PATH: &str = "/api/v2/mix/position/single-position";
const CANDLES_PATH: &str = "/api/v2/mix/market/candles";
const PLACE_ORDER_PATH: &str = "/api/v2/mix/order/place-order";
const SET_LEVERAGE_PATH: &str = "/api/v2/mix/account/set-leverage";

/// Largest candle page Bitget serves in one request.
const MAX_CANDLES_PER_REQUEST: usize = 1000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Bitget client.
#[derive(Debug, Clone)]
pub struct BitgetClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Futures product line, e.g. `USDT-FUTURES`.
    pub product_type: String,

    /// Margin asset, e.g. `USDT`.
    pub margin_coin: String,

    /// Requests per second limit.
    pub requests_per_second: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Send the demo-trading header on every request.
    pub demo: bool,
}

impl Default for BitgetClientConfig {
    fn default() -> Self {
        Self {
            base_url: BITGET_API_URL.to_string(),
            product_type: "USDT-FUTURES".to_string(),
            margin_coin: "USDT".to_string(),
            requests_per_second: nonzero!(10u32),
            timeout_secs: 10,
            demo: false,
        }
    }
}

impl BitgetClientConfig {
    /// Builds the client configuration from the application settings.
    #[must_use]
    pub fn from_settings(bitget: &BitgetConfig, trading: &TradingConfig) -> Self {
        Self {
            base_url: bitget.api_url.trim_end_matches('/').to_string(),
            product_type: trading.product_type.clone(),
            margin_coin: trading.margin_coin.clone(),
            requests_per_second: NonZeroU32::new(bitget.requests_per_second)
                .unwrap_or(nonzero!(10u32)),
            timeout_secs: bitget.timeout_secs,
            demo: bitget.demo,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Enables or disables demo trading.
    #[must_use]
    pub fn with_demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// Bitget API client with rate limiting.
pub struct BitgetClient {
    config: BitgetClientConfig,

    http: Client,

    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,

    /// Present only for trading clients.
    auth: Option<BitgetAuth>,
}

impl std::fmt::Debug for BitgetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitgetClient")
            .field("base_url", &self.config.base_url)
            .field("product_type", &self.config.product_type)
            .field("demo", &self.config.demo)
            .field("authenticated", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}

impl BitgetClient {
    /// Creates a client; `auth` is required for position and order endpoints.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: BitgetClientConfig, auth: Option<BitgetAuth>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BitgetError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_second(config.requests_per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
            auth,
        })
    }

    /// Creates a client for public market data only.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn public(config: BitgetClientConfig) -> Result<Self> {
        Self::new(config, None)
    }

    /// Creates a client that can trade.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn authenticated(config: BitgetClientConfig, auth: BitgetAuth) -> Result<Self> {
        Self::new(config, Some(auth))
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    #[must_use]
    pub fn config(&self) -> &BitgetClientConfig {
        &self.config
    }

    /// Rejects values that would corrupt the query string or request path.
    fn validate_param<'a>(name: &str, value: &'a str) -> Result<&'a str> {
        if value.is_empty() {
            return Err(BitgetError::Configuration(format!("{name} cannot be empty")));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(BitgetError::Configuration(format!(
                "invalid {name}: must contain only alphanumeric, hyphen, or underscore: {value}"
            )));
        }
        if value.len() > 32 {
            return Err(BitgetError::Configuration(format!(
                "invalid {name}: exceeds maximum length of 32: {}",
                value.len()
            )));
        }
        Ok(value)
    }

    fn require_auth(&self) -> Result<&BitgetAuth> {
        self.auth.as_ref().ok_or_else(|| {
            BitgetError::Configuration("this endpoint requires API credentials".to_string())
        })
    }

    fn common_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("Accept", "application/json")
            .header("locale", "en-US");
        if self.config.demo {
            builder.header("paptrading", "1")
        } else {
            builder
        }
    }

    /// Waits for the rate limiter and makes a GET request; signed when `signed`.
    async fn get<T: DeserializeOwned>(&self, path_with_query: &str, signed: bool) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path_with_query);
        tracing::debug!("GET {}", url);

        let mut request = self.common_headers(self.http.get(&url));
        if signed {
            let headers = self.require_auth()?.sign_request("GET", path_with_query, "")?;
            for (name, value) in headers.as_tuples() {
                request = request.header(name, value);
            }
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Waits for the rate limiter and makes a signed POST request.
    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        let body_json = serde_json::to_string(body)?;
        let headers = self.require_auth()?.sign_request("POST", path, &body_json)?;

        tracing::debug!("POST {} body_len={}", url, body_json.len());

        let mut request = self
            .common_headers(self.http.post(&url))
            .header("Content-Type", "application/json");
        for (name, value) in headers.as_tuples() {
            request = request.header(name, value);
        }

        let response = request.body(body_json).send().await?;
        self.handle_response(response).await
    }

    /// Maps HTTP status and the Bitget envelope onto [`BitgetError`].
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(BitgetError::RateLimit);
        }

        if status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(BitgetError::api(status.as_u16(), text));
        }

        let text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => BitgetError::from_code(envelope.code, envelope.msg),
                Err(_) => BitgetError::from_code(status.as_u16().to_string(), text),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        envelope.into_data()
    }

    // =========================================================================
    // Market Endpoints
    // =========================================================================

    /// Gets the most recent `limit` candles for `symbol` at `granularity`.
    ///
    /// # Errors
    /// Returns error if the API call fails or a row cannot be parsed.
    pub async fn get_candles(&self, symbol: &str, granularity: &str, limit: usize) -> Result<Vec<Bar>> {
        let symbol = Self::validate_param("symbol", symbol)?;
        let granularity = Self::validate_param("granularity", granularity)?;
        let limit = limit.clamp(1, MAX_CANDLES_PER_REQUEST);

        let path = format!(
            "{CANDLES_PATH}?symbol={symbol}&productType={}&granularity={granularity}&limit={limit}",
            self.config.product_type
        );

        let rows: Vec<RawCandle> = self.get(&path, false).await?;
        rows.into_iter().map(Bar::try_from).collect()
    }

    // =========================================================================
    // Account Endpoints
    // =========================================================================

    /// Gets every position record the account holds for `symbol`.
    ///
    /// # Errors
    /// Returns error if the API call fails or a record cannot be parsed.
    pub async fn get_positions(&self, symbol: &str) -> Result<Vec<PositionRecord>> {
        let symbol = Self::validate_param("symbol", symbol)?;
        let path = format!(
            "{POSITION_PATH}?symbol={symbol}&productType={}&marginCoin={}",
            self.config.product_type, self.config.margin_coin
        );

        let raw: Vec<RawPosition> = self.get(&path, true).await?;
        raw.into_iter().map(PositionRecord::try_from).collect()
    }

    /// Sets the leverage used for new positions on `symbol`.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        let symbol = Self::validate_param("symbol", symbol)?;
        let body = SetLeverageBody {
            symbol: symbol.to_string(),
            product_type: self.config.product_type.clone(),
            margin_coin: self.config.margin_coin.clone(),
            leverage: leverage.to_string(),
        };

        let _: serde_json::Value = self.post(SET_LEVERAGE_PATH, &body).await?;
        tracing::info!(symbol, leverage, "Leverage set");
        Ok(())
    }

    // =========================================================================
    // Order Endpoints
    // =========================================================================

    /// Places a single market order.
    ///
    /// # Errors
    /// Returns error if the order is rejected or the call fails.
    pub async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck> {
        let symbol = Self::validate_param("symbol", &order.symbol)?;
        let client_oid = uuid::Uuid::new_v4().to_string();
        let body = PlaceOrderBody {
            symbol: symbol.to_string(),
            product_type: self.config.product_type.clone(),
            margin_mode: "crossed".to_string(),
            margin_coin: self.config.margin_coin.clone(),
            size: order.quantity.normalize().to_string(),
            side: order.side.as_str().to_string(),
            order_type: "market".to_string(),
            reduce_only: if order.reduce_only { "YES" } else { "NO" }.to_string(),
            client_oid: client_oid.clone(),
        };

        tracing::debug!(
            symbol,
            side = %order.side,
            size = %body.size,
            reduce_only = order.reduce_only,
            client_oid = %client_oid,
            "Submitting market order"
        );

        let data: PlaceOrderData = self.post(PLACE_ORDER_PATH, &body).await?;
        Ok(OrderAck {
            order_id: data.order_id,
            client_order_id: data.client_oid.or(Some(client_oid)),
        })
    }
}
