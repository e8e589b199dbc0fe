use thiserror::Error;

use saju_core::error::SajuError;

#[derive(Debug, Error)]
pub enum PillarError {
    #[error("invalid birth tuple: {0}")]
    InvalidBirth(String),

    #[error("pillar service timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("pillar service error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("pillar service transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unparseable pillar symbol: {0}")]
    Parse(String),
}

impl From<PillarError> for SajuError {
    fn from(e: PillarError) -> Self {
        match e {
            PillarError::InvalidBirth(msg) => SajuError::Validation(msg),
            PillarError::Timeout { ms } => SajuError::UpstreamTimeout {
                what: "pillar-api".into(),
                ms,
            },
            PillarError::Api { status, message } => SajuError::UpstreamUnavailable {
                what: "pillar-api".into(),
                reason: format!("{}: {}", status, message),
            },
            PillarError::Http(e) => SajuError::UpstreamUnavailable {
                what: "pillar-api".into(),
                reason: e.to_string(),
            },
            PillarError::Parse(sym) => SajuError::PillarParse(sym),
        }
    }
}

pub type Result<T> = std::result::Result<T, PillarError>;
