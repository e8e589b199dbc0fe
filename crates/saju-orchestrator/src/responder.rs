//! Platform-neutral reply surface. The orchestrator only ever talks to this
//! trait; adapters translate to the platform's wire shapes.

use async_trait::async_trait;

use saju_core::error::SajuError;
use saju_core::types::UiAction;

/// Opaque handle to a sent message, used for progress edits/deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef(pub String);

/// Inbound message union. The adapter is the sole producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text { text: String },
    /// Tap on a quick action; `data` is the payload of the chosen [`UiAction`].
    Callback { data: String },
}

#[async_trait]
pub trait Responder: Send + Sync {
    /// Send a text reply with optional quick actions.
    async fn send_text(&self, text: &str, actions: &[UiAction]) -> Result<MessageRef, SajuError>;

    /// Edit a previously sent message. Best-effort on progress loops.
    async fn edit_text(&self, msg: &MessageRef, text: &str) -> Result<(), SajuError>;

    async fn delete(&self, msg: &MessageRef) -> Result<(), SajuError>;

    /// Typing indicator; platforms without one keep the default no-op.
    async fn send_typing(&self) {}

    /// Whether progress-message editing makes sense for this delivery mode.
    /// Request/response adapters (Kakao sync) return false.
    fn supports_progress(&self) -> bool {
        true
    }
}
