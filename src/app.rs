use std::sync::Arc;

use log::info;
use teloxide::{prelude::*, types::Update as TgUpdate, RequestError};
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::deployment::BotMode;
use crate::handlers::{handle_callback, handle_start, handle_web_app_data};
use crate::responder::Platform;
use crate::update::{normalize, Update, UpdateKind};

#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to authenticate with Telegram: {0}")]
    Auth(#[source] RequestError),
    #[error("failed to set webhook: {0}")]
    Webhook(#[source] RequestError),
}

/// The single authenticated bot handle plus its routing table.
///
/// Built once at startup and shared read-only through an `Arc` by the HTTP
/// server and, in polling mode, the polling worker.
pub struct Application {
    platform: Arc<dyn Platform>,
    bot_username: String,
    webapp_url: Url,
    mode: BotMode,
}

impl Application {
    pub fn new(
        platform: Arc<dyn Platform>,
        bot_username: impl Into<String>,
        webapp_url: Url,
        mode: BotMode,
    ) -> Self {
        Self {
            platform,
            bot_username: bot_username.into(),
            webapp_url,
            mode,
        }
    }

    /// Authenticates against Telegram. Any failure here is fatal to the process.
    pub async fn initialize(bot: Bot, config: &Config) -> Result<Arc<Self>, InitError> {
        let me = bot.get_me().await.map_err(InitError::Auth)?;
        let bot_username = me.username.clone().unwrap_or_default();
        info!("🔑 Authenticated as @{bot_username}");

        Ok(Arc::new(Self::new(
            Arc::new(bot),
            bot_username,
            config.webapp_url.clone(),
            config.mode,
        )))
    }

    pub fn mode(&self) -> BotMode {
        self.mode
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Routes one normalized update to exactly one handler.
    pub async fn dispatch(&self, update: &Update) {
        let platform = self.platform.as_ref();
        match &update.kind {
            UpdateKind::Start => {
                handle_start(platform, &self.webapp_url, update.chat_id, &update.user_name).await
            }
            UpdateKind::Callback { query_id } => handle_callback(platform, query_id).await,
            UpdateKind::WebAppData { data } => {
                handle_web_app_data(platform, update.chat_id, data).await
            }
        }
    }

    /// Normalizes a platform update and dispatches it if any handler wants it.
    pub async fn process(&self, raw: TgUpdate) {
        if let Some(update) = normalize(raw, &self.bot_username) {
            info!(
                "📨 {:?} from {} in chat {}",
                update.kind, update.user_name, update.chat_id
            );
            self.dispatch(&update).await;
        }
    }
}
