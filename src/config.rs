//! Environment-derived configuration, validated before any network call.

use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    MissingVar(&'static str),
    #[error("RADIUS must be a whole number of miles, got {0:?}")]
    InvalidRadius(String),
}

pub const DEFAULT_MAKE: &str = "BMW";
pub const DEFAULT_MODEL: &str = "3 Series";
pub const DEFAULT_POSTCODE: &str = "E15 4EQ";
/// Large enough to cover all of the UK.
pub const DEFAULT_RADIUS: u32 = 150_000;

/// Caller-supplied search parameters. The quality filters (year, price,
/// mileage, transmission, write-off exclusion) are fixed in the URL
/// builder and not configurable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub make: String,
    pub model: String,
    pub postcode: String,
    pub radius: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            make: DEFAULT_MAKE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            postcode: DEFAULT_POSTCODE.to_string(),
            radius: DEFAULT_RADIUS,
        }
    }
}

/// Full run configuration: Telegram credentials plus search parameters.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    pub search: SearchParams,
}

impl Config {
    /// Load from the process environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honored.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    fn from_lookup(vars: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = vars("BOT_TOKEN").ok_or(ConfigError::MissingVar("BOT_TOKEN"))?;
        let chat_id = vars("CHAT_ID").ok_or(ConfigError::MissingVar("CHAT_ID"))?;

        let radius = match vars("RADIUS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidRadius(raw))?,
            None => DEFAULT_RADIUS,
        };

        Ok(Self {
            bot_token,
            chat_id,
            search: SearchParams {
                make: vars("CAR_MAKE").unwrap_or_else(|| DEFAULT_MAKE.to_string()),
                model: vars("CAR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                postcode: vars("POSTCODE").unwrap_or_else(|| DEFAULT_POSTCODE.to_string()),
                radius,
            },
        })
    }
}
