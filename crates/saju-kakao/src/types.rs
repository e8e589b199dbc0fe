//! Kakao OpenBuilder skill wire shapes (simplified to what the core uses).

use serde::{Deserialize, Serialize};

use saju_core::types::UiAction;

use crate::format::flatten_markdown;
use crate::split::split_bubbles;

#[derive(Debug, Clone, Deserialize)]
pub struct SkillRequest {
    #[serde(rename = "userRequest")]
    pub user_request: UserRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRequest {
    pub user: KakaoUser,
    #[serde(default)]
    pub utterance: String,
    /// Single-use URL, valid for ~60 seconds, present when the bot block
    /// declared callback support.
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KakaoUser {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillResponse {
    pub version: &'static str,
    pub template: Template,
}

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub outputs: Vec<Output>,
    #[serde(rename = "quickReplies", skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Output {
    #[serde(rename = "simpleText")]
    pub simple_text: SimpleText,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimpleText {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickReply {
    pub label: String,
    pub action: &'static str,
    #[serde(rename = "messageText")]
    pub message_text: String,
}

impl SkillResponse {
    /// Flatten, split into bubbles, and map quick actions to reply chips.
    pub fn from_text(text: &str, actions: &[UiAction]) -> Self {
        let flat = flatten_markdown(text);
        let outputs = split_bubbles(&flat)
            .into_iter()
            .map(|text| Output {
                simple_text: SimpleText { text },
            })
            .collect();
        let quick_replies = actions
            .iter()
            .map(|a| QuickReply {
                label: a.label.clone(),
                action: "message",
                message_text: a.payload.clone(),
            })
            .collect();
        Self {
            version: "2.0",
            template: Template {
                outputs,
                quick_replies,
            },
        }
    }
}

/// Acknowledgement telling the builder the full answer arrives by callback.
pub fn callback_ack() -> serde_json::Value {
    serde_json::json!({"version": "2.0", "useCallback": true})
}
