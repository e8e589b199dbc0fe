//! Telegram channel: webhook `Update` payloads in, Bot API calls out.
//!
//! Ingress is the gateway's webhook route — the long-polling Dispatcher is
//! not used. The adapter is the sole producer of the inbound message union.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{Update, UpdateKind};
use tracing::{debug, warn};

use saju_core::error::SajuError;
use saju_core::types::{Platform, UiAction, UserKey};
use saju_orchestrator::{Inbound, Orchestrator, Responder};
use saju_push::PushChannel;

use crate::error::map_request_error;
use crate::responder::{keyboard_from, TelegramResponder};
use crate::send::send_chunked;

pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Handle one webhook update end to end. Updates with no usable text or
    /// callback data are dropped silently (the webhook already ACKed).
    pub async fn process_update(&self, orch: Arc<Orchestrator>, update: Update) {
        match update.kind {
            UpdateKind::Message(msg) => {
                let Some(from) = msg.from.as_ref() else {
                    return;
                };
                if from.is_bot {
                    return;
                }
                let Some(text) = msg.text() else {
                    debug!(chat = msg.chat.id.0, "update without message text — skipped");
                    return;
                };

                let key = UserKey::new(Platform::Telegram, from.id.0.to_string());
                let display_name = from.first_name.clone();
                let responder: Arc<dyn Responder> =
                    Arc::new(TelegramResponder::new(self.bot.clone(), msg.chat.id));

                responder.send_typing().await;
                orch.handle(
                    &key,
                    Some(&display_name),
                    Inbound::Text {
                        text: text.to_string(),
                    },
                    responder,
                )
                .await;
            }
            UpdateKind::CallbackQuery(query) => {
                // ACK immediately so the client stops its spinner.
                let _ = self.bot.answer_callback_query(query.id.clone()).await;

                let Some(data) = query.data.clone() else {
                    return;
                };
                let Some(chat_id) = query.message.as_ref().map(|m| m.chat().id) else {
                    warn!("callback query without originating message");
                    return;
                };

                let key = UserKey::new(Platform::Telegram, query.from.id.0.to_string());
                let responder: Arc<dyn Responder> =
                    Arc::new(TelegramResponder::new(self.bot.clone(), chat_id));
                orch.handle(&key, None, Inbound::Callback { data }, responder)
                    .await;
            }
            _ => {}
        }
    }
}

#[async_trait]
impl PushChannel for TelegramChannel {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn send_push(
        &self,
        key: &UserKey,
        text: &str,
        actions: &[UiAction],
    ) -> Result<(), SajuError> {
        let chat_id: i64 = key
            .platform_user_id
            .parse()
            .map_err(|_| SajuError::Validation(format!("bad chat id: {}", key.platform_user_id)))?;
        send_chunked(&self.bot, ChatId(chat_id), text, keyboard_from(actions)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_update_parses_into_expected_shape() {
        // Shape check on the raw webhook payload Telegram actually posts.
        let raw = serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 1365,
                "date": 1754006400,
                "chat": {"id": 1111, "type": "private", "first_name": "지민"},
                "from": {"id": 1111, "is_bot": false, "first_name": "지민"},
                "text": "올해 연애운 어때?"
            }
        });
        let update: Update = serde_json::from_str(&raw.to_string()).expect("valid update");
        match update.kind {
            UpdateKind::Message(msg) => {
                assert_eq!(msg.text(), Some("올해 연애운 어때?"));
                assert_eq!(msg.from.as_ref().unwrap().id.0, 1111);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn update_without_text_is_detected() {
        let raw = serde_json::json!({
            "update_id": 11,
            "message": {
                "message_id": 1366,
                "date": 1754006400,
                "chat": {"id": 1111, "type": "private", "first_name": "지민"},
                "from": {"id": 1111, "is_bot": false, "first_name": "지민"},
                "photo": [{
                    "file_id": "f1",
                    "file_unique_id": "u1",
                    "width": 90,
                    "height": 90,
                    "file_size": 1302
                }]
            }
        });
        let update: Update = serde_json::from_str(&raw.to_string()).expect("valid update");
        match update.kind {
            UpdateKind::Message(msg) => assert!(msg.text().is_none()),
            other => panic!("unexpected kind: {:?}", other),
        }
    }
}
