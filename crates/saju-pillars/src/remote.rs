//! Client for the external pillar computation service.
//!
//! Primary path for `compute`; the local calculator takes over after the
//! bounded retries are exhausted. Responses may carry hanja symbols — they
//! are normalized to hangul before caching so both paths cache identically.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use saju_core::types::BirthInfo;

use crate::error::{PillarError, Result};
use crate::types::{Pillar, Pillars};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
const MAX_RETRIES: u32 = 2;
const BACKOFF_BASE_MS: u64 = 500;

pub struct PillarApiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    pillars: ApiPillars,
}

#[derive(Deserialize)]
struct ApiPillars {
    year: String,
    month: String,
    day: String,
    hour: String,
}

impl PillarApiClient {
    /// `base_url` without a trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Fetch pillars, retrying on timeout/5xx with exponential backoff.
    pub async fn fetch(&self, birth: &BirthInfo) -> Result<Pillars> {
        let mut last_err: Option<PillarError> = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = BACKOFF_BASE_MS * (1 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            match self.fetch_once(birth).await {
                Ok(p) => return Ok(p),
                // A parse failure is not transient — the payload itself is bad.
                Err(e @ PillarError::Parse(_)) => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "pillar API attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(PillarError::Timeout {
            ms: REQUEST_TIMEOUT.as_millis() as u64,
        }))
    }

    async fn fetch_once(&self, birth: &BirthInfo) -> Result<Pillars> {
        let url = format!("{}/api/saju", self.base_url);
        debug!(year = birth.year, month = birth.month, "querying pillar API");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("y", birth.year.to_string()),
                ("m", birth.month.to_string()),
                ("d", birth.day.to_string()),
                ("hh", birth.hour.to_string()),
                ("mm", birth.minute.to_string()),
                ("calendar", "solar".to_string()),
                ("gender", birth.gender.api_label().to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PillarError::Timeout {
                        ms: REQUEST_TIMEOUT.as_millis() as u64,
                    }
                } else {
                    PillarError::Http(e)
                }
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PillarError::Api { status, message });
        }

        let api: ApiResponse = resp
            .json()
            .await
            .map_err(|e| PillarError::Parse(e.to_string()))?;

        Ok(Pillars {
            year: parse_symbol(&api.pillars.year)?,
            month: parse_symbol(&api.pillars.month)?,
            day: parse_symbol(&api.pillars.day)?,
            hour: parse_symbol(&api.pillars.hour)?,
        })
    }
}

fn parse_symbol(s: &str) -> Result<Pillar> {
    Pillar::parse(s.trim()).ok_or_else(|| PillarError::Parse(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbol_accepts_hanja_and_hangul() {
        assert_eq!(parse_symbol("甲戌").unwrap().name(), "갑술");
        assert_eq!(parse_symbol("갑술").unwrap().name(), "갑술");
        assert_eq!(parse_symbol(" 乙亥 ").unwrap().name(), "을해");
    }

    #[test]
    fn parse_symbol_rejects_unknown() {
        assert!(matches!(parse_symbol("??"), Err(PillarError::Parse(_))));
        assert!(matches!(parse_symbol(""), Err(PillarError::Parse(_))));
    }
}
