//! 08:00 KST push fan-out. Each user's pipeline is independent: one blocked
//! or failing user never stalls the rest. Inter-user spawns are paced 50 ms
//! apart to stay under platform rate limits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Datelike;
use tokio::task::JoinSet;
use tracing::{info, warn};

use saju_analysis::fortune;
use saju_analysis::interest::InterestCategory;
use saju_core::clock::KstClock;
use saju_core::error::SajuError;
use saju_core::types::{Platform, UiAction, UserKey};
use saju_llm::correction::correct_day_pillar;
use saju_llm::prompt;
use saju_llm::provider::ChatProvider;
use saju_pillars::PillarService;
use saju_store::interests::InterestStore;
use saju_store::profiles::{Profile, ProfileStore};
use saju_store::pushlog::{PushLogStore, PushStatus};

const ACTIVITY_WINDOW_DAYS: i64 = 7;
const INTER_USER_DELAY: Duration = Duration::from_millis(50);
const RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRIES: u32 = 2;

/// Outbound push surface per platform. Adapters implement this; the stub in
/// tests scripts failures.
#[async_trait]
pub trait PushChannel: Send + Sync {
    fn platform(&self) -> Platform;

    async fn send_push(
        &self,
        key: &UserKey,
        text: &str,
        actions: &[UiAction],
    ) -> Result<(), SajuError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PushSummary {
    pub total: u32,
    pub success: u32,
    pub failed: u32,
}

pub struct DailyPushScheduler {
    pub profiles: Arc<ProfileStore>,
    pub interests: Arc<InterestStore>,
    pub pushlog: Arc<PushLogStore>,
    pub pillar: Arc<PillarService>,
    pub chat: Option<Arc<dyn ChatProvider>>,
    pub clock: Arc<dyn KstClock>,
    pub channels: Vec<Arc<dyn PushChannel>>,
}

impl DailyPushScheduler {
    /// Run one fan-out. Returns aggregate counts; `success` includes sends
    /// that needed a retry.
    pub async fn run(&self) -> PushSummary {
        let now = self.clock.now_kst();
        let eligible = match self.profiles.list_push_eligible(now, ACTIVITY_WINDOW_DAYS) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "push eligibility query failed");
                return PushSummary::default();
            }
        };

        info!(users = eligible.len(), "daily push fan-out starting");
        let mut set: JoinSet<PushStatus> = JoinSet::new();

        for profile in eligible {
            let task = PushTask {
                profiles: Arc::clone(&self.profiles),
                interests: Arc::clone(&self.interests),
                pushlog: Arc::clone(&self.pushlog),
                pillar: Arc::clone(&self.pillar),
                chat: self.chat.clone(),
                channel: self
                    .channels
                    .iter()
                    .find(|c| c.platform() == profile.key.platform)
                    .cloned(),
                clock: Arc::clone(&self.clock),
            };
            set.spawn(async move { task.push_one(profile).await });
            tokio::time::sleep(INTER_USER_DELAY).await;
        }

        let mut summary = PushSummary::default();
        while let Some(joined) = set.join_next().await {
            summary.total += 1;
            match joined {
                Ok(PushStatus::Success) | Ok(PushStatus::Retried) => summary.success += 1,
                Ok(PushStatus::Failed) => summary.failed += 1,
                Err(e) => {
                    warn!(error = %e, "push task panicked");
                    summary.failed += 1;
                }
            }
        }

        info!(
            total = summary.total,
            success = summary.success,
            failed = summary.failed,
            "daily push fan-out finished"
        );
        summary
    }
}

struct PushTask {
    profiles: Arc<ProfileStore>,
    interests: Arc<InterestStore>,
    pushlog: Arc<PushLogStore>,
    pillar: Arc<PillarService>,
    chat: Option<Arc<dyn ChatProvider>>,
    channel: Option<Arc<dyn PushChannel>>,
    clock: Arc<dyn KstClock>,
}

impl PushTask {
    async fn push_one(&self, profile: Profile) -> PushStatus {
        let key = profile.key.clone();
        let now = self.clock.now_kst();

        let Some(channel) = &self.channel else {
            warn!(user = %key, "no push channel for platform");
            return self.log(&key, InterestCategory::General, "", PushStatus::Failed, now);
        };

        let category = self.pick_category(&key, now.date_naive().day() as usize);

        let pillars = match self.pillar.compute(&profile.birth).await {
            Ok(p) => p,
            Err(e) => {
                warn!(user = %key, error = %e, "pillar compute failed for push");
                return self.log(&key, category, "", PushStatus::Failed, now);
            }
        };
        let report = fortune::analyze(&pillars, now.date_naive());

        let name = profile.display_name.as_deref().unwrap_or("회원");
        let mut text = match self.generate(category, &report, &pillars, now).await {
            Some(t) if passes_post_rules(&t, category) => t,
            _ => saju_push_fallback(category, name, report.overall),
        };
        text = correct_day_pillar(&text, report.today_pillar);

        let actions = vec![
            UiAction::new("🔮 오늘 운세 확인", "push_open"),
            UiAction::new("🔓 프리미엄 해제", "push_unlock"),
        ];

        // Delivery with bounded retry. Blocked users are deactivated and
        // never retried.
        let mut status = PushStatus::Failed;
        for attempt in 0..=MAX_RETRIES {
            match channel.send_push(&key, &text, &actions).await {
                Ok(()) => {
                    status = if attempt == 0 {
                        PushStatus::Success
                    } else {
                        PushStatus::Retried
                    };
                    break;
                }
                Err(SajuError::PlatformUserBlocked) => {
                    info!(user = %key, "user blocked the bot — deactivating profile");
                    if let Err(e) = self.profiles.set_active(&key, false) {
                        warn!(user = %key, error = %e, "failed to deactivate profile");
                    }
                    status = PushStatus::Failed;
                    break;
                }
                Err(e) => {
                    warn!(user = %key, attempt, error = %e, "push send failed");
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }

        self.log(&key, category, &text, status, now)
    }

    /// Top-2 tracked interests rotated by day-of-month, else the weekday base.
    fn pick_category(&self, key: &UserKey, day_ordinal: usize) -> InterestCategory {
        let top = self.interests.top(key, 2).unwrap_or_default();
        let top: Vec<InterestCategory> = top
            .into_iter()
            .filter(|c| *c != InterestCategory::General)
            .collect();
        if top.is_empty() {
            weekday_base(self.clock.now_kst().weekday())
        } else {
            top[day_ordinal % top.len()]
        }
    }

    async fn generate(
        &self,
        category: InterestCategory,
        report: &fortune::FortuneReport,
        pillars: &saju_pillars::types::Pillars,
        now: chrono::DateTime<chrono::FixedOffset>,
    ) -> Option<String> {
        let chat = self.chat.clone()?;
        let pkg = prompt::daily_push(category, report, pillars, now);
        let request = pkg.into_request(Vec::new());
        match chat.send(&request).await {
            Ok(r) => Some(r.content),
            Err(e) => {
                warn!(error = %e, "push LLM call failed — using fallback template");
                None
            }
        }
    }

    fn log(
        &self,
        key: &UserKey,
        category: InterestCategory,
        text: &str,
        status: PushStatus,
        now: chrono::DateTime<chrono::FixedOffset>,
    ) -> PushStatus {
        if let Err(e) = self
            .pushlog
            .append(key, &category.to_string(), text, status, now)
        {
            warn!(user = %key, error = %e, "push log append failed");
        }
        status
    }
}

fn weekday_base(weekday: chrono::Weekday) -> InterestCategory {
    use chrono::Weekday::*;
    match weekday {
        Mon => InterestCategory::Career,
        Tue => InterestCategory::Money,
        Wed => InterestCategory::Love,
        Thu => InterestCategory::Health,
        Fri => InterestCategory::Money,
        Sat => InterestCategory::Love,
        Sun => InterestCategory::General,
    }
}

/// Post-rules: category emoji on the first line, at least four ████ blanks,
/// final line ends with a question mark.
fn passes_post_rules(text: &str, category: InterestCategory) -> bool {
    let mut lines = text.trim().lines();
    let Some(first) = lines.next() else {
        return false;
    };
    if !first.contains(category.emoji()) {
        return false;
    }
    if text.matches("████").count() < 4 {
        return false;
    }
    text.trim_end().ends_with('?')
}

/// Per-category template used when the LLM is unavailable or its output
/// violates the post-rules. Interpolates name and score.
fn saju_push_fallback(category: InterestCategory, name: &str, score: i32) -> String {
    let (first, hidden) = match category {
        InterestCategory::Love => (
            "오늘은 인연의 기운이 움직이는 날이에요",
            "특히 ████ 시간대에 ████ 와의 만남이",
        ),
        InterestCategory::Money => (
            "재물의 흐름이 바뀌는 하루예요",
            "████ 관련한 ████ 소식이 들어올 수 있고",
        ),
        InterestCategory::Career => (
            "일터에서 당신의 존재감이 커지는 날이에요",
            "████ 에게서 ████ 제안이 올 수 있어요",
        ),
        _ => (
            "오늘의 기운이 평소와 다르게 흐르고 있어요",
            "████ 무렵의 ████ 선택이 흐름을 바꾸고",
        ),
    };
    format!(
        "{} {}님!\n{} (오늘 {}점)\n{} ████ 의 도움이 따라요. ████ 을 놓치지 마세요.\n\
         지금 확인해 볼까요?",
        category.emoji(),
        name,
        first,
        score,
        hidden
    )
}
