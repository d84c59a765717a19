//! Service configuration loaded from the environment.

use serde::{Deserialize, Serialize};

use vendora_core::Currency;
use vendora_observability::{LogConfig, LogFormat};

pub const ENV_DEFAULT_CURRENCY: &str = "VENDORA_DEFAULT_CURRENCY";
pub const ENV_LOG_FORMAT: &str = "VENDORA_LOG_FORMAT";
pub const ENV_LOG_FILTER: &str = "VENDORA_LOG_FILTER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Currency new sales are opened in.
    pub default_currency: Currency,
    pub log: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::BRL,
            log: LogConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Read `VENDORA_*` variables, falling back to defaults (with a warning)
    /// for anything missing or malformed.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_currency = match lookup(ENV_DEFAULT_CURRENCY) {
            Some(raw) => raw.parse::<Currency>().unwrap_or_else(|err| {
                tracing::warn!(%err, "{ENV_DEFAULT_CURRENCY} is invalid; using {}", defaults.default_currency);
                defaults.default_currency
            }),
            None => defaults.default_currency,
        };

        let format = match lookup(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse::<LogFormat>().unwrap_or_else(|err| {
                tracing::warn!(%err, "{ENV_LOG_FORMAT} is invalid; using json");
                LogFormat::Json
            }),
            None => defaults.log.format,
        };

        let filter = lookup(ENV_LOG_FILTER)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or(defaults.log.filter);

        Self {
            default_currency,
            log: LogConfig { format, filter },
        }
    }
}
