//! Kakao skill delivery: answer synchronously within the platform's ~5 s
//! window, or — when the request carries a callbackUrl — return a
//! `useCallback` ack and POST the finished answer to the single-use URL.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{info, warn};

use saju_core::error::SajuError;
use saju_core::types::{Platform, UiAction, UserKey};
use saju_orchestrator::{Inbound, MessageRef, Orchestrator, Responder};

use crate::types::{callback_ack, SkillRequest, SkillResponse};

/// Stay inside Kakao's 5-second synchronous window.
const SYNC_DEADLINE: Duration = Duration::from_secs(4);
/// The callback URL lives ~60 seconds; stop a little before that.
const CALLBACK_DEADLINE: Duration = Duration::from_secs(55);

const TIMEOUT_PLACEHOLDER: &str =
    "풀이에 시간이 조금 걸리고 있어요. 잠시 후 다시 한번 물어봐 주세요!";

/// Collects everything the orchestrator wants to say into one buffer. The
/// Kakao response is a single template, so edits and deletes are no-ops and
/// the progress loop is skipped entirely.
#[derive(Default)]
pub struct CollectingResponder {
    parts: Mutex<Vec<String>>,
    actions: Mutex<Vec<UiAction>>,
}

impl CollectingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> (String, Vec<UiAction>) {
        let text = self.parts.lock().unwrap().join("\n\n");
        let actions = self.actions.lock().unwrap().clone();
        (text, actions)
    }
}

#[async_trait]
impl Responder for CollectingResponder {
    async fn send_text(&self, text: &str, actions: &[UiAction]) -> Result<MessageRef, SajuError> {
        let mut parts = self.parts.lock().unwrap();
        parts.push(text.to_string());
        self.actions.lock().unwrap().extend_from_slice(actions);
        Ok(MessageRef(format!("kakao-{}", parts.len())))
    }

    async fn edit_text(&self, _msg: &MessageRef, _text: &str) -> Result<(), SajuError> {
        Ok(())
    }

    async fn delete(&self, _msg: &MessageRef) -> Result<(), SajuError> {
        Ok(())
    }

    fn supports_progress(&self) -> bool {
        false
    }
}

pub struct KakaoAdapter {
    client: reqwest::Client,
}

impl Default for KakaoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl KakaoAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn post_callback(&self, url: &str, response: &SkillResponse) {
        match self.client.post(url).json(response).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("kakao callback delivered");
            }
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "kakao callback rejected");
            }
            Err(e) => {
                warn!(error = %e, "kakao callback POST failed");
            }
        }
    }
}

/// Run one skill request to completion. Always produces a JSON body the
/// route returns with HTTP 200 — even internal failures become a simpleText.
pub async fn handle_skill_request(
    adapter: Arc<KakaoAdapter>,
    orch: Arc<Orchestrator>,
    request: SkillRequest,
) -> serde_json::Value {
    let key = UserKey::new(Platform::Kakao, request.user_request.user.id.clone());
    let utterance = request.user_request.utterance.clone();
    let callback_url = request.user_request.callback_url.clone();

    let collector = Arc::new(CollectingResponder::new());
    let (tx, mut rx) = oneshot::channel::<()>();

    {
        let orch = Arc::clone(&orch);
        let collector = Arc::clone(&collector);
        let key = key.clone();
        tokio::spawn(async move {
            orch.handle(
                &key,
                None,
                Inbound::Text { text: utterance },
                collector as Arc<dyn Responder>,
            )
            .await;
            let _ = tx.send(());
        });
    }

    // Fast path: finished inside the synchronous window.
    if tokio::time::timeout(SYNC_DEADLINE, &mut rx).await.is_ok() {
        let (text, actions) = collector.drain();
        return serde_json::to_value(SkillResponse::from_text(&text, &actions))
            .unwrap_or_else(|_| callback_ack());
    }

    match callback_url {
        Some(url) => {
            // Keep working in the background; deliver once to the callback.
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move {
                match tokio::time::timeout(CALLBACK_DEADLINE, rx).await {
                    Ok(_) => {
                        let (text, actions) = collector.drain();
                        let response = SkillResponse::from_text(&text, &actions);
                        adapter.post_callback(&url, &response).await;
                    }
                    Err(_) => {
                        warn!(user = %key, "kakao work exceeded the callback deadline — dropped");
                    }
                }
            });
            callback_ack()
        }
        None => {
            warn!(user = %key, "slow kakao turn without callbackUrl — sending placeholder");
            serde_json::to_value(SkillResponse::from_text(TIMEOUT_PLACEHOLDER, &[]))
                .unwrap_or_else(|_| callback_ack())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collector_buffers_in_order() {
        let c = CollectingResponder::new();
        c.send_text("첫 번째", &[]).await.unwrap();
        c.send_text("두 번째", &[UiAction::new("보기", "unlock_premium")])
            .await
            .unwrap();
        let (text, actions) = c.drain();
        assert_eq!(text, "첫 번째\n\n두 번째");
        assert_eq!(actions.len(), 1);
        assert!(!c.supports_progress());
    }

    #[tokio::test]
    async fn edits_and_deletes_are_noops() {
        let c = CollectingResponder::new();
        let m = c.send_text("본문", &[]).await.unwrap();
        c.edit_text(&m, "수정").await.unwrap();
        c.delete(&m).await.unwrap();
        let (text, _) = c.drain();
        assert_eq!(text, "본문");
    }
}
