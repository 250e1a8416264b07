use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Prefix for environment overrides, e.g. `TRADER_TRADING__SYMBOL=ETHUSDT`.
pub const ENV_PREFIX: &str = "TRADER_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Builds the layered configuration: defaults, then the TOML file, then
    /// `TRADER_`-prefixed environment variables (`__` separates sections).
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates application configuration.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed or fails validation.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let config: AppConfig = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        config.validate().context("Invalid configuration")?;
        tracing::debug!(
            path = %path.display(),
            symbol = %config.trading.symbol,
            mode = ?config.trading.mode,
            "Configuration loaded"
        );

        Ok(config)
    }
}
