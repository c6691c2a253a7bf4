//! Process configuration from the environment

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_SURVEY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EFFECT_TIMEOUT_SECS: u64 = 90;
const DEFAULT_CONVERSATION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_EVICTION_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the bot needs to start
#[derive(Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub secret_key: String,
    /// Survey API base, as configured
    pub base_url: String,
    pub telegram_api_url: String,
    pub survey_timeout: Duration,
    /// Upper bound for one effect, all of its survey calls included
    pub effect_timeout: Duration,
    pub conversation_ttl: Duration,
    pub eviction_interval: Duration,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("survey_timeout", &self.survey_timeout)
            .field("effect_timeout", &self.effect_timeout)
            .field("conversation_ttl", &self.conversation_ttl)
            .field("eviction_interval", &self.eviction_interval)
            .finish()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let seconds = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            match get(name) {
                None => Ok(Duration::from_secs(default)),
                Some(value) => match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
                    _ => Err(ConfigError::Invalid { name, value }),
                },
            }
        };

        Ok(Self {
            bot_token: required("TOKEN")?,
            secret_key: required("SECRET_KEY")?,
            base_url: required("BASE_URL")?,
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            survey_timeout: seconds("SURVEY_HTTP_TIMEOUT_SECS", DEFAULT_SURVEY_TIMEOUT_SECS)?,
            effect_timeout: seconds("EFFECT_TIMEOUT_SECS", DEFAULT_EFFECT_TIMEOUT_SECS)?,
            conversation_ttl: seconds("CONVERSATION_TTL_SECS", DEFAULT_CONVERSATION_TTL_SECS)?,
            eviction_interval: seconds("EVICTION_INTERVAL_SECS", DEFAULT_EVICTION_INTERVAL_SECS)?,
        })
    }
}
