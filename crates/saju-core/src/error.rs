use thiserror::Error;

use crate::types::Tier;

/// Cross-crate error kinds. Leaf crates define their own error enums and
/// convert into this one at the orchestration boundary.
#[derive(Debug, Error)]
pub enum SajuError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// Spam throttle rejection. `retry_after` is whole seconds, 1..=3.
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("upstream timeout ({what}) after {ms}ms")]
    UpstreamTimeout { what: String, ms: u64 },

    #[error("upstream unavailable ({what}): {reason}")]
    UpstreamUnavailable { what: String, reason: String },

    #[error("unparseable pillar symbol: {0}")]
    PillarParse(String),

    /// The platform reported the user blocked the bot. The push scheduler
    /// keys profile deactivation off this exact kind.
    #[error("user blocked the bot")]
    PlatformUserBlocked,

    #[error("daily quota exceeded for tier {tier}")]
    QuotaExceeded { tier: Tier },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SajuError {
    /// Short kind name appended to the generic user-facing error text.
    pub fn kind(&self) -> &'static str {
        match self {
            SajuError::Validation(_) => "VALIDATION",
            SajuError::Auth(_) => "AUTH",
            SajuError::RateLimited { .. } => "RATE_LIMITED",
            SajuError::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            SajuError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            SajuError::PillarParse(_) => "PILLAR_PARSE",
            SajuError::PlatformUserBlocked => "PLATFORM_USER_BLOCKED",
            SajuError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            SajuError::NotFound(_) => "NOT_FOUND",
            SajuError::Internal(_) => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, SajuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_are_distinct() {
        let kinds = [
            SajuError::Validation("x".into()).kind(),
            SajuError::Auth("x".into()).kind(),
            SajuError::RateLimited { retry_after: 1 }.kind(),
            SajuError::UpstreamTimeout {
                what: "llm".into(),
                ms: 1,
            }
            .kind(),
            SajuError::UpstreamUnavailable {
                what: "llm".into(),
                reason: "down".into(),
            }
            .kind(),
            SajuError::PillarParse("x".into()).kind(),
            SajuError::PlatformUserBlocked.kind(),
            SajuError::QuotaExceeded { tier: Tier::Free }.kind(),
            SajuError::NotFound("x".into()).kind(),
            SajuError::Internal("x".into()).kind(),
        ];
        let mut dedup = kinds.to_vec();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), kinds.len());
    }
}
