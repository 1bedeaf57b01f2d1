use log::{info, warn};
use teloxide::types::ChatId;
use url::Url;

use crate::commands::{
    game_result_text, welcome_text, GameResult, DATA_RECEIVED_TEXT, LAUNCH_BUTTON_TEXT,
};
use crate::responder::{acknowledge, deliver, Platform, Reply};

pub fn start_reply(user_name: &str, webapp_url: &Url) -> Reply {
    Reply::Launch {
        text: welcome_text(user_name),
        button_text: LAUNCH_BUTTON_TEXT.to_string(),
        url: webapp_url.clone(),
    }
}

pub fn web_app_data_reply(data: &str) -> Reply {
    match GameResult::parse(data) {
        Ok(game) => {
            info!(
                "🎲 Game result: result={}, win={}, balance={}",
                game.result, game.win, game.balance
            );
            Reply::Text(game_result_text(&game))
        }
        Err(e) => {
            warn!("❌ Could not parse web app data '{data}': {e}");
            Reply::Text(DATA_RECEIVED_TEXT.to_string())
        }
    }
}

pub async fn handle_start(
    platform: &dyn Platform,
    webapp_url: &Url,
    chat_id: ChatId,
    user_name: &str,
) {
    info!("🎯 /start from {user_name} in chat {chat_id}");
    let reply = start_reply(user_name, webapp_url);
    if deliver(platform, chat_id, &reply).await {
        info!("✅ Welcome sent to {user_name}");
    }
}

pub async fn handle_callback(platform: &dyn Platform, query_id: &str) {
    acknowledge(platform, query_id).await;
}

pub async fn handle_web_app_data(platform: &dyn Platform, chat_id: ChatId, data: &str) {
    info!("📱 Web app data received in chat {chat_id}");
    let reply = web_app_data_reply(data);
    deliver(platform, chat_id, &reply).await;
}
