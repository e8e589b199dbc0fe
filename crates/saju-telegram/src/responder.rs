//! `Responder` implementation over a teloxide `Bot` bound to one chat.

use async_trait::async_trait;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, MessageId};

use saju_core::error::SajuError;
use saju_core::types::UiAction;
use saju_orchestrator::{MessageRef, Responder};

use crate::error::map_request_error;
use crate::send::send_chunked;

pub struct TelegramResponder {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramResponder {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

pub fn keyboard_from(actions: &[UiAction]) -> Option<InlineKeyboardMarkup> {
    if actions.is_empty() {
        return None;
    }
    let rows: Vec<Vec<InlineKeyboardButton>> = actions
        .iter()
        .map(|a| vec![InlineKeyboardButton::callback(a.label.clone(), a.payload.clone())])
        .collect();
    Some(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl Responder for TelegramResponder {
    async fn send_text(&self, text: &str, actions: &[UiAction]) -> Result<MessageRef, SajuError> {
        let message =
            send_chunked(&self.bot, self.chat_id, text, keyboard_from(actions)).await?;
        Ok(MessageRef(message.id.0.to_string()))
    }

    async fn edit_text(&self, msg: &MessageRef, text: &str) -> Result<(), SajuError> {
        let id: i32 = msg
            .0
            .parse()
            .map_err(|_| SajuError::Internal(format!("bad message ref: {}", msg.0)))?;
        self.bot
            .edit_message_text(self.chat_id, MessageId(id), text)
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn delete(&self, msg: &MessageRef) -> Result<(), SajuError> {
        let id: i32 = msg
            .0
            .parse()
            .map_err(|_| SajuError::Internal(format!("bad message ref: {}", msg.0)))?;
        self.bot
            .delete_message(self.chat_id, MessageId(id))
            .await
            .map_err(map_request_error)?;
        Ok(())
    }

    async fn send_typing(&self) {
        let _ = self
            .bot
            .send_chat_action(self.chat_id, ChatAction::Typing)
            .await;
    }
}
