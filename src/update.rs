use log::{info, warn};
use teloxide::types::{ChatId, Message, Update as TgUpdate, UpdateKind as TgUpdateKind, User};
use teloxide::dispatching::dialogue::GetChatId;
use thiserror::Error;

use crate::commands::Command;

const FALLBACK_USER_NAME: &str = "player";

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("malformed update body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("update has an unrecognized or incomplete payload: {0}")]
    Incomplete(serde_json::Value),
}

/// One inbound event, normalized from either webhook push or long-poll fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub chat_id: ChatId,
    pub user_name: String,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Start,
    Callback { query_id: String },
    /// Raw string the served page submitted via `sendData`.
    WebAppData { data: String },
}

/// Parses a webhook request body into a platform update.
///
/// teloxide keeps a payload it cannot decode as `UpdateKind::Error`; that is
/// rejected here the same way as malformed JSON.
pub fn parse_webhook_body(body: &[u8]) -> Result<TgUpdate, AdapterError> {
    let update: TgUpdate = serde_json::from_slice(body)?;
    match update.kind {
        TgUpdateKind::Error(value) => Err(AdapterError::Incomplete(value)),
        _ => Ok(update),
    }
}

/// Maps a platform update onto one of the routable kinds, or `None` if no handler wants it.
pub fn normalize(update: TgUpdate, bot_username: &str) -> Option<Update> {
    match update.kind {
        TgUpdateKind::Message(msg) => from_message(&msg, bot_username),
        TgUpdateKind::CallbackQuery(query) => Some(Update {
            chat_id: query
                .chat_id()
                .unwrap_or(ChatId(query.from.id.0 as i64)),
            user_name: display_name(Some(&query.from)),
            kind: UpdateKind::Callback {
                query_id: query.id.to_string(),
            },
        }),
        _ => {
            info!("🔄 Ignoring update {:?}: no handler for this kind", update.id);
            None
        }
    }
}

fn from_message(msg: &Message, bot_username: &str) -> Option<Update> {
    let user_name = display_name(msg.from.as_ref());

    if let Some(web_app_data) = msg.web_app_data() {
        return Some(Update {
            chat_id: msg.chat.id,
            user_name,
            kind: UpdateKind::WebAppData {
                data: web_app_data.data.clone(),
            },
        });
    }

    let text = msg.text()?;
    match Command::parse_for(text, bot_username) {
        Some(Command::Start(payload)) => {
            if !payload.is_empty() {
                info!("🔗 /start payload in chat {}: '{payload}'", msg.chat.id);
            }
            Some(Update {
                chat_id: msg.chat.id,
                user_name,
                kind: UpdateKind::Start,
            })
        }
        None => {
            if text.starts_with('/') {
                warn!("❓ Unrecognized command in chat {}: '{text}'", msg.chat.id);
            }
            None
        }
    }
}

fn display_name(user: Option<&User>) -> String {
    user.map(|u| u.first_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_USER_NAME)
        .to_string()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn parse(value: serde_json::Value) -> TgUpdate {
        parse_webhook_body(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_normalize_start_command() {
        let update = normalize(parse(start_message(1, 42, "Ann", "/start")), "nimble_bot").unwrap();
        assert_eq!(update.chat_id, ChatId(42));
        assert_eq!(update.user_name, "Ann");
        assert_eq!(update.kind, UpdateKind::Start);
    }

    #[test]
    fn test_normalize_start_addressed_to_other_bot() {
        let raw = parse(start_message(2, 42, "Ann", "/start@someone_else_bot"));
        assert_eq!(normalize(raw, "nimble_bot"), None);
    }

    #[test]
    fn test_normalize_plain_text_is_ignored() {
        let raw = parse(start_message(3, 42, "Ann", "hello there"));
        assert_eq!(normalize(raw, "nimble_bot"), None);
    }

    #[test]
    fn test_normalize_web_app_data() {
        let raw = parse(web_app_data_message(4, 42, r#"{"result":5,"win":true,"balance":10}"#));
        let update = normalize(raw, "nimble_bot").unwrap();
        assert_eq!(
            update.kind,
            UpdateKind::WebAppData {
                data: r#"{"result":5,"win":true,"balance":10}"#.to_string()
            }
        );
    }

    #[test]
    fn test_normalize_callback_query() {
        let update = normalize(parse(callback_query(5, 42, "4382")), "nimble_bot").unwrap();
        assert_eq!(update.chat_id, ChatId(42));
        assert_eq!(
            update.kind,
            UpdateKind::Callback {
                query_id: "4382".to_string()
            }
        );
    }

    #[test]
    fn test_normalize_callback_prefers_message_chat() {
        let raw = parse(callback_query_on_message(6, 42, 777, "4383"));
        let update = normalize(raw, "nimble_bot").unwrap();
        assert_eq!(update.chat_id, ChatId(777));
    }

    #[test]
    fn test_malformed_bodies_are_errors() {
        assert!(parse_webhook_body(b"not json").is_err());
        assert!(parse_webhook_body(b"").is_err());
        assert!(parse_webhook_body(br#"{"message":{}}"#).is_err());
    }

    #[test]
    fn test_incomplete_payloads_are_errors() {
        for body in [
            r#"{"update_id":1,"message":{}}"#,
            r#"{"update_id":1,"message":{"text":"/start"}}"#,
            r#"{"update_id":1,"callback_query":{"id":"x"}}"#,
        ] {
            assert!(
                matches!(
                    parse_webhook_body(body.as_bytes()),
                    Err(AdapterError::Incomplete(_))
                ),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_name(None), "player");
    }
}
