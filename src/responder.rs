use async_trait::async_trait;
use log::{info, warn};
use teloxide::{
    prelude::*,
    types::{CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, WebAppInfo},
    RequestError,
};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] RequestError),
}

/// Reply shapes the bot sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// HTML text with a single inline button that launches the web app at `url`.
    Launch {
        text: String,
        button_text: String,
        url: Url,
    },
    Text(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Launch { text, .. } | Reply::Text(text) => text,
        }
    }
}

// Outbound calls to the messaging platform
#[async_trait]
pub trait Platform: Send + Sync {
    async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<(), PlatformError>;
    async fn answer_callback(&self, query_id: &str) -> Result<(), PlatformError>;
}

#[async_trait]
impl Platform for Bot {
    async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<(), PlatformError> {
        match reply {
            Reply::Launch {
                text,
                button_text,
                url,
            } => {
                let button = InlineKeyboardButton::web_app(
                    button_text.clone(),
                    WebAppInfo { url: url.clone() },
                );
                let keyboard = InlineKeyboardMarkup::new(vec![vec![button]]);
                self.send_message(chat_id, text.clone())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(keyboard)
                    .await?;
            }
            Reply::Text(text) => {
                self.send_message(chat_id, text.clone()).await?;
            }
        }
        Ok(())
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), PlatformError> {
        self.answer_callback_query(CallbackQueryId(query_id.to_owned()))
            .await?;
        Ok(())
    }
}

/// Sends `reply`, logging the outcome. Failures never propagate.
pub async fn deliver(platform: &dyn Platform, chat_id: ChatId, reply: &Reply) -> bool {
    match platform.send_reply(chat_id, reply).await {
        Ok(()) => {
            info!("📤 Reply sent to chat {chat_id} ({} chars)", reply.text().len());
            true
        }
        Err(e) => {
            warn!("❌ Failed to send reply to chat {chat_id}: {e}");
            false
        }
    }
}

/// Answers a callback query, logging the outcome. Failures never propagate.
pub async fn acknowledge(platform: &dyn Platform, query_id: &str) -> bool {
    match platform.answer_callback(query_id).await {
        Ok(()) => {
            info!("👆 Callback query {query_id} answered");
            true
        }
        Err(e) => {
            warn!("❌ Failed to answer callback query {query_id}: {e}");
            false
        }
    }
}
