//! Provider seams for chat completion and embeddings. The orchestrator and
//! push scheduler only ever see these traits — tests plug in stubs.

use async_trait::async_trait;
use thiserror::Error;

use saju_core::error::SajuError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("provider not configured")]
    NotConfigured,
}

impl From<ProviderError> for SajuError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout { ms } => SajuError::UpstreamTimeout {
                what: "llm".into(),
                ms,
            },
            ProviderError::RateLimited { retry_after_ms } => SajuError::RateLimited {
                retry_after: (retry_after_ms / 1000).max(1),
            },
            other => SajuError::UpstreamUnavailable {
                what: "llm".into(),
                reason: other.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text into the system-wide fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}
