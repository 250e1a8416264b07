//! HMAC-SHA256 request signing for the Bitget API.
//!
//! The signature is computed over `timestamp + METHOD + requestPath[?query] + body`
//! and sent base64-encoded in `ACCESS-SIGN`.
//!
//! # Security
//!
//! - Credentials are loaded from environment variables
//! - Secrets are held in [`SecretString`] and NEVER logged

use crate::error::{BitgetError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Configuration
// =============================================================================

/// Environment variable names holding Bitget credentials.
#[derive(Debug, Clone)]
pub struct BitgetAuthConfig {
    pub api_key_env: String,
    pub secret_env: String,
    pub passphrase_env: String,
}

impl Default for BitgetAuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: "BITGET_API_KEY".to_string(),
            secret_env: "BITGET_API_SECRET".to_string(),
            passphrase_env: "BITGET_API_PASSPHRASE".to_string(),
        }
    }
}

// =============================================================================
// Signed Headers
// =============================================================================

/// Headers required for authenticated Bitget requests.
#[derive(Clone)]
pub struct SignedHeaders {
    pub access_key: String,
    pub signature: String,
    pub timestamp: String,
    pub passphrase: String,
}

impl std::fmt::Debug for SignedHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedHeaders")
            .field("access_key", &self.access_key)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

impl SignedHeaders {
    /// Returns headers as tuples for reqwest.
    #[must_use]
    pub fn as_tuples(&self) -> [(&'static str, &str); 4] {
        [
            ("ACCESS-KEY", &self.access_key),
            ("ACCESS-SIGN", &self.signature),
            ("ACCESS-TIMESTAMP", &self.timestamp),
            ("ACCESS-PASSPHRASE", &self.passphrase),
        ]
    }
}

// =============================================================================
// BitgetAuth
// =============================================================================

/// Bitget API credentials and signer.
pub struct BitgetAuth {
    api_key: String,
    secret: SecretString,
    passphrase: SecretString,
}

impl std::fmt::Debug for BitgetAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitgetAuth")
            .field("api_key", &self.api_key)
            .field("secret", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

impl BitgetAuth {
    pub fn new(api_key: impl Into<String>, secret: SecretString, passphrase: SecretString) -> Self {
        Self {
            api_key: api_key.into(),
            secret,
            passphrase,
        }
    }

    /// Reads credentials from the environment.
    ///
    /// # Errors
    /// Returns a configuration error naming the first missing variable.
    pub fn from_env(config: &BitgetAuthConfig) -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    BitgetError::Configuration(format!("missing environment variable: {name}"))
                })
        };

        let api_key = read(&config.api_key_env)?;
        let secret = SecretString::from(read(&config.secret_env)?);
        let passphrase = SecretString::from(read(&config.passphrase_env)?);

        Ok(Self::new(api_key, secret, passphrase))
    }

    /// Signs a request at the current time.
    ///
    /// `request_path` includes the query string, e.g.
    /// `/api/v2/mix/market/candles?symbol=BTCUSDT`.
    ///
    /// # Errors
    /// Returns error if the HMAC key is rejected.
    pub fn sign_request(&self, method: &str, request_path: &str, body: &str) -> Result<SignedHeaders> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        self.sign_at(&timestamp, method, request_path, body)
    }

    /// Signs a request with an explicit millisecond timestamp.
    ///
    /// # Errors
    /// Returns error if the HMAC key is rejected.
    pub fn sign_at(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> Result<SignedHeaders> {
        let message = format!("{timestamp}{}{request_path}{body}", method.to_uppercase());

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| BitgetError::Signing(format!("invalid key length: {e}")))?;
        mac.update(message.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        Ok(SignedHeaders {
            access_key: self.api_key.clone(),
            signature,
            timestamp: timestamp.to_string(),
            passphrase: self.passphrase.expose_secret().to_string(),
        })
    }
}
