use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde_json::{json, Value};

use crate::app::Application;
use crate::deployment::BotMode;
use crate::update::parse_webhook_body;

pub const WEBAPP_HTML: &str = include_str!("../static/index.html");
const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Application>,
    pub webhook_secret: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(WEBAPP_HTML)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "bot": "running" }))
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if let Some(secret) = &state.webhook_secret {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(secret.as_str()) {
            warn!("🚫 Webhook request with missing or wrong secret token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "status": "unauthorized" })),
            );
        }
    }

    let update = match parse_webhook_body(&body) {
        Ok(update) => update,
        Err(e) => {
            error!("❌ Webhook error: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error" })),
            );
        }
    };

    info!("🔗 Webhook received update: {:?}", update.id);
    if state.app.mode() == BotMode::Polling {
        warn!("⚠️ Webhook update received while polling; it may also arrive via polling");
    }

    state.app.process(update).await;
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
