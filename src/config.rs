use std::env;
use thiserror::Error;
use url::Url;

use crate::deployment::BotMode;

pub const DEFAULT_WEBAPP_URL: &str = "https://nimble3tgbot.onrender.com";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BOT_TOKEN environment variable not set")]
    MissingToken,
    #[error("BOT_TOKEN is empty")]
    EmptyToken,
    #[error("{name} is not a valid absolute URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("PORT must be a valid number, got: {0}")]
    InvalidPort(String),
    #[error("BOT_MODE must be 'polling' or 'webhook', got: {0}")]
    InvalidMode(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub webapp_url: Url,
    pub port: u16,
    pub mode: BotMode,
    /// URL registered with Telegram in webhook mode.
    pub webhook_url: Url,
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .or_else(|| lookup("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::MissingToken)?;
        if bot_token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        let webapp_url = parse_url(
            "WEBAPP_URL",
            lookup("WEBAPP_URL").unwrap_or_else(|| DEFAULT_WEBAPP_URL.to_string()),
        )?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let mode = match lookup("BOT_MODE") {
            Some(raw) => raw.parse::<BotMode>()?,
            None if lookup("WEBHOOK_MODE").is_some_and(|v| v == "true") => BotMode::Webhook,
            None => BotMode::Polling,
        };

        let webhook_url = match lookup("WEBHOOK_URL") {
            Some(raw) => parse_url("WEBHOOK_URL", raw)?,
            None => default_webhook_url(&webapp_url)?,
        };

        let webhook_secret = lookup("WEBHOOK_SECRET").filter(|s| !s.is_empty());

        Ok(Self {
            bot_token,
            webapp_url,
            port,
            mode,
            webhook_url,
            webhook_secret,
        })
    }
}

fn parse_url(name: &'static str, value: String) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|_| ConfigError::InvalidUrl { name, value })
}

fn default_webhook_url(base: &Url) -> Result<Url, ConfigError> {
    let joined = format!("{}/webhook", base.as_str().trim_end_matches('/'));
    parse_url("WEBHOOK_URL", joined)
}
