//! The per-user conversation state machine. Resolution order (first match
//! wins): harmful content, meta commands, /start, missing profile, pending
//! actions, intents, message classification, general saju Q&A. A pending
//! action always beats intent classification.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{error, info, warn};

use saju_analysis::{compat, datepick, fortune, interest, wealth};
use saju_classics::ClassicsRetriever;
use saju_core::birth::parse_birth_text;
use saju_core::clock::KstClock;
use saju_core::error::SajuError;
use saju_core::types::{Tier, UiAction, UserKey};
use saju_llm::correction::correct_day_pillar;
use saju_llm::freemium::{blur, split_reply};
use saju_llm::prompt;
use saju_llm::provider::{ChatMessage, ChatProvider, Role};
use saju_pillars::luck::analyze_year_luck;
use saju_pillars::strength::analyze_structure;
use saju_pillars::PillarService;
use saju_store::billing::BillingStore;
use saju_store::history::HistoryStore;
use saju_store::interests::InterestStore;
use saju_store::pending::{ActionType, PendingPayload, PendingStore};
use saju_store::profiles::{Profile, ProfileStore};
use saju_store::pushlog::PushLogStore;
use saju_store::usage::UsageStore;
use saju_store::Db;

use crate::entitlements::EntitlementGate;
use crate::intents::{classify_message, detect_intent, is_harmful, Intent, MessageClass};
use crate::progress::run_with_progress;
use crate::replies;
use crate::responder::{Inbound, Responder};
use crate::session::UserGates;
use crate::throttle::SpamThrottle;

const BLUR_MAX_BLOCKS: usize = 60;

pub struct Orchestrator {
    pub profiles: Arc<ProfileStore>,
    pub history: Arc<HistoryStore>,
    pub pending: Arc<PendingStore>,
    pub interests: Arc<InterestStore>,
    pub pushlog: Arc<PushLogStore>,
    pub gate: EntitlementGate,
    pub pillar: Arc<PillarService>,
    pub retriever: Arc<ClassicsRetriever>,
    pub chat: Option<Arc<dyn ChatProvider>>,
    pub clock: Arc<dyn KstClock>,
    throttle: SpamThrottle,
    gates: UserGates,
}

impl Orchestrator {
    pub fn new(
        db: Db,
        pillar: Arc<PillarService>,
        retriever: Arc<ClassicsRetriever>,
        chat: Option<Arc<dyn ChatProvider>>,
        clock: Arc<dyn KstClock>,
    ) -> Self {
        Self {
            profiles: Arc::new(ProfileStore::new(db.clone())),
            history: Arc::new(HistoryStore::new(db.clone())),
            pending: Arc::new(PendingStore::new(db.clone())),
            interests: Arc::new(InterestStore::new(db.clone())),
            pushlog: Arc::new(PushLogStore::new(db.clone())),
            gate: EntitlementGate::new(
                Arc::new(BillingStore::new(db.clone())),
                Arc::new(UsageStore::new(db)),
            ),
            pillar,
            retriever,
            chat,
            clock,
            throttle: SpamThrottle::default(),
            gates: UserGates::new(),
        }
    }

    /// Replace the spam throttle (tests use a zero-width window).
    pub fn with_throttle(mut self, throttle: SpamThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Entry point for every inbound message on every platform.
    ///
    /// Never returns an error to the adapter: failures become a user-visible
    /// apology carrying the error kind, and are logged with user and phase.
    pub async fn handle(
        &self,
        key: &UserKey,
        display_name: Option<&str>,
        inbound: Inbound,
        responder: Arc<dyn Responder>,
    ) {
        // Per-user serialization: turns for one user are strictly ordered.
        let _gate = self.gates.acquire(&key.to_string()).await;

        let result = match &inbound {
            Inbound::Text { text } => {
                self.handle_text(key, display_name, text, Arc::clone(&responder))
                    .await
            }
            Inbound::Callback { data } => {
                self.handle_callback(key, data, Arc::clone(&responder)).await
            }
        };

        if let Err(e) = result {
            error!(user = %key, kind = e.kind(), error = %e, "turn failed");
            let text = match &e {
                SajuError::RateLimited { retry_after } => replies::rate_limited(*retry_after),
                SajuError::QuotaExceeded { tier } => replies::quota_exceeded(*tier),
                SajuError::Validation(_) => replies::ASK_BIRTH.to_string(),
                _ => replies::apology_with_kind(e.kind()),
            };
            let _ = responder.send_text(&text, &[]).await;
        }
    }

    async fn handle_text(
        &self,
        key: &UserKey,
        display_name: Option<&str>,
        text: &str,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        // Spam throttle gates everything, even meta commands.
        if let Err(retry_after) = self.throttle.check(&key.to_string()) {
            responder
                .send_text(&replies::rate_limited(retry_after), &[])
                .await?;
            return Ok(());
        }

        // Harmful content wins over everything, pending actions included.
        if is_harmful(text) {
            responder.send_text(replies::HARMFUL, &[]).await?;
            return Ok(());
        }

        let now = self.clock.now_kst();

        // 1. Meta / special commands.
        if let Some(reply) = self.meta_command(key, text, &now).await? {
            responder.send_text(&reply.0, &reply.1).await?;
            self.record_activity(key, &now);
            return Ok(());
        }

        // 2. Platform start with optional referral code.
        if let Some(rest) = text.strip_prefix("/start") {
            let code = rest.trim();
            if code.starts_with("ref_") {
                self.pending.set(
                    key,
                    &PendingPayload::Referral {
                        code: code.to_string(),
                    },
                    None,
                    now,
                )?;
            }
            responder.send_text(replies::WELCOME, &[]).await?;
            return Ok(());
        }

        // 3. Profile missing: a parseable birth tuple registers; anything
        //    else prompts for one.
        let profile = match self.profiles.get(key)? {
            Some(p) => p,
            None => {
                match parse_birth_text(text) {
                    Some(birth) => {
                        self.register_and_first_read(key, display_name, birth, responder)
                            .await?
                    }
                    None => {
                        responder.send_text(replies::ASK_BIRTH, &[]).await?;
                    }
                }
                return Ok(());
            }
        };

        // 4. Pending actions beat intent classification.
        if let Some(PendingPayload::Compatibility { question }) =
            self.pending.get(key, ActionType::Compatibility, now)?
        {
            match parse_birth_text(text) {
                Some(partner) => {
                    self.pending.delete(key, ActionType::Compatibility)?;
                    self.run_compatibility(key, &profile, &question, partner, responder)
                        .await?;
                }
                None => {
                    responder
                        .send_text(replies::REPROMPT_PARTNER_BIRTH, &[])
                        .await?;
                }
            }
            self.record_activity(key, &now);
            return Ok(());
        }

        // 5–8. Intent routing.
        match detect_intent(text) {
            Some(Intent::Compatibility) => {
                self.pending.set(
                    key,
                    &PendingPayload::Compatibility {
                        question: text.to_string(),
                    },
                    None,
                    now,
                )?;
                responder.send_text(replies::ASK_PARTNER_BIRTH, &[]).await?;
            }
            Some(Intent::WealthDeepDive) => {
                self.run_wealth(key, &profile, text, responder).await?;
            }
            Some(Intent::AuspiciousDate) => {
                self.run_datepick(key, &profile, text, responder).await?;
            }
            Some(Intent::DailyFortune) => {
                self.run_daily_fortune(key, &profile, responder).await?;
            }
            None => {
                // 9–10. Message classification; saju questions fall through
                // to the general grounded analyzer.
                match classify_message(text) {
                    MessageClass::Harmful => {
                        responder.send_text(replies::HARMFUL, &[]).await?;
                    }
                    MessageClass::Greeting => {
                        responder.send_text(replies::GREETING, &[]).await?;
                    }
                    MessageClass::MetaAboutAi => {
                        responder.send_text(replies::META_AI, &[]).await?;
                    }
                    MessageClass::CasualChat => {
                        responder.send_text(replies::CASUAL, &[]).await?;
                    }
                    MessageClass::SajuQuestion => {
                        self.run_general(key, &profile, text, responder).await?;
                    }
                }
            }
        }
        self.record_activity(key, &now);
        Ok(())
    }

    // ── Meta commands ────────────────────────────────────────────────────────

    async fn meta_command(
        &self,
        key: &UserKey,
        text: &str,
        now: &chrono::DateTime<chrono::FixedOffset>,
    ) -> Result<Option<(String, Vec<UiAction>)>, SajuError> {
        if text.starts_with("프로필") || text.starts_with("내 정보") {
            let reply = match self.profiles.get(key)? {
                Some(p) => {
                    let tier = self.gate.tier(key, Some(&p), now)?;
                    format!(
                        "📋 등록된 프로필\n생년월일: {}년 {}월 {}일 {}시 {}분\n성별: {}\n\
                         등급: {}\n남은 무료 해제권: {}장",
                        p.birth.year,
                        p.birth.month,
                        p.birth.day,
                        p.birth.hour,
                        p.birth.minute,
                        p.birth.gender.korean(),
                        tier,
                        p.free_unlocks
                    )
                }
                None => replies::PROFILE_NONE.to_string(),
            };
            return Ok(Some((reply, Vec::new())));
        }

        if text.starts_with("초기화") || text.starts_with("다시 입력") {
            self.profiles.delete(key)?;
            return Ok(Some((replies::PROFILE_RESET.to_string(), Vec::new())));
        }

        if text.starts_with("초대") || text.starts_with("친구 초대") {
            if self.profiles.get(key)?.is_none() {
                return Ok(Some((replies::PROFILE_NONE.to_string(), Vec::new())));
            }
            let code = self.profiles.ensure_referral_code(key)?;
            return Ok(Some((replies::invite_text(&code), Vec::new())));
        }

        if text.starts_with("해제권") || text.starts_with("무료 해제") {
            let reply = self.unlock_last_premium(key, now).await?;
            return Ok(Some(reply));
        }

        Ok(None)
    }

    /// Reveal the PREMIUM half of the most recent tagged assistant turn,
    /// spending entitlement (premium tier passes free, otherwise one unlock).
    async fn unlock_last_premium(
        &self,
        key: &UserKey,
        now: &chrono::DateTime<chrono::FixedOffset>,
    ) -> Result<(String, Vec<UiAction>), SajuError> {
        let turns = self.history.recent(key, 50)?;
        let premium = turns.iter().rev().find_map(|t| {
            if t.role != "assistant" {
                return None;
            }
            let split = split_reply(&t.content);
            split.has_premium.then_some(split.premium_text)
        });

        let Some(premium) = premium else {
            return Ok((replies::NO_PREMIUM_CONTENT.to_string(), Vec::new()));
        };

        let profile = self.profiles.get(key)?;
        let tier = self.gate.tier(key, profile.as_ref(), now)?;
        let entitled = tier == Tier::Premium || self.profiles.use_free_unlock(key)?;
        if entitled {
            Ok((format!("🔓 프리미엄 풀이\n\n{}", premium), Vec::new()))
        } else {
            Ok((replies::NO_FREE_UNLOCKS.to_string(), Vec::new()))
        }
    }

    // ── Registration + first reading ─────────────────────────────────────────

    async fn register_and_first_read(
        &self,
        key: &UserKey,
        display_name: Option<&str>,
        birth: saju_core::types::BirthInfo,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let now = self.clock.now_kst();
        self.profiles.upsert(key, &birth, display_name, now)?;

        // A staged referral is consumed exactly once: both sides get a free
        // unlock.
        if let Some(PendingPayload::Referral { code }) =
            self.pending.take(key, ActionType::Referral, now)?
        {
            self.profiles.award_free_unlock(key)?;
            if let Some(referrer) = self.profiles.find_by_referral_code(&code)? {
                self.profiles.award_free_unlock(&referrer)?;
                info!(user = %key, referrer = %referrer, "referral consumed");
            }
        }

        responder.send_text(replies::PROFILE_REGISTERED, &[]).await?;

        let pillars = self.pillar.compute(&birth).await?;
        let structure = analyze_structure(&pillars);
        let header = format!(
            "📊 나의 사주 명식\n{}\n\n오행 분포\n{}",
            pillars.chart_line(),
            structure.distribution_lines()
        );

        let Some(chat) = self.chat.clone() else {
            responder
                .send_text(&format!("{}\n{}", header, replies::LLM_DISABLED), &[])
                .await?;
            self.record_activity(key, &now);
            return Ok(());
        };

        self.gate.check(key, None, &now)?;
        let luck = analyze_year_luck(&pillars, now.year(), now.month() as u32);
        let pkg = prompt::first_reading(&pillars, &structure, &luck, now);
        let request = pkg.into_request(Vec::new());

        let interim = self.spawn_interim("첫 사주 풀이", now);
        let analysis = async {
            chat.send(&request).await.map_err(SajuError::from)
        };
        let response = run_with_progress(Arc::clone(&responder), interim, analysis).await?;
        let content = correct_day_pillar(&response.content, pillars.day);

        responder
            .send_text(&format!("{}\n{}", header, content), &[])
            .await?;
        self.history.append(key, "assistant", &content, now)?;
        self.gate.commit(key, &now)?;
        self.record_activity(key, &now);
        Ok(())
    }

    // ── Analyzer paths ───────────────────────────────────────────────────────

    async fn run_compatibility(
        &self,
        key: &UserKey,
        profile: &Profile,
        question: &str,
        partner: saju_core::types::BirthInfo,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let now = self.clock.now_kst();
        self.gate.check(key, Some(profile), &now)?;

        let (mine, theirs) = tokio::join!(
            self.pillar.compute(&profile.birth),
            self.pillar.compute(&partner)
        );
        let (mine, theirs) = (mine?, theirs?);
        let report = compat::analyze(&mine, &theirs, now.date_naive());

        let header = format!(
            "💞 궁합 차트\n나: {}\n상대: {}\n종합 {}점",
            report.my_chart, report.partner_chart, report.overall
        );

        let Some(chat) = self.chat.clone() else {
            responder.send_text(&header, &[]).await?;
            return Ok(());
        };

        let pkg = prompt::compatibility(question, &report, now);
        let request = pkg.into_request(Vec::new());
        let interim = self.spawn_interim(question, now);
        let analysis = async { chat.send(&request).await.map_err(SajuError::from) };
        let response = run_with_progress(Arc::clone(&responder), interim, analysis).await?;
        let content = correct_day_pillar(&response.content, mine.day);

        self.deliver_paid_reply(key, question, &header, &content, responder, now)
            .await
    }

    async fn run_wealth(
        &self,
        key: &UserKey,
        profile: &Profile,
        question: &str,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let now = self.clock.now_kst();
        self.gate.check(key, Some(profile), &now)?;

        let pillars = self.pillar.compute(&profile.birth).await?;
        let luck = analyze_year_luck(&pillars, now.year(), now.month() as u32);
        let report = wealth::analyze(&pillars, &luck);

        let mut header = format!("💰 재물운 분석\n종합 {}점\n", report.overall);
        for (name, score) in report.axes() {
            header.push_str(&format!("- {}: {}점\n", name, score));
        }

        let Some(chat) = self.chat.clone() else {
            responder.send_text(&header, &[]).await?;
            return Ok(());
        };

        let pkg = prompt::wealth(question, &pillars, &report, &luck, now);
        let request = pkg.into_request(Vec::new());
        let interim = self.spawn_interim(question, now);
        let analysis = async { chat.send(&request).await.map_err(SajuError::from) };
        let response = run_with_progress(Arc::clone(&responder), interim, analysis).await?;
        let content = correct_day_pillar(&response.content, pillars.day);

        self.deliver_paid_reply(key, question, &header, &content, responder, now)
            .await
    }

    /// Deterministic scored day list — no LLM, not billable.
    async fn run_datepick(
        &self,
        key: &UserKey,
        profile: &Profile,
        text: &str,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let now = self.clock.now_kst();
        let pillars = self.pillar.compute(&profile.birth).await?;
        let event = datepick::EventType::from_text(text);
        let scored = datepick::pick_days(
            &pillars,
            event,
            now.date_naive(),
            datepick::DEFAULT_WINDOW_DAYS,
        );
        let top = datepick::best_days(&scored, 3);

        let mut reply = format!("📅 {}하기 좋은 날 (앞으로 2주)\n\n", event.korean());
        for day in &top {
            reply.push_str(&format!(
                "⭐ {}월 {}일 — {}일 · {} {}점\n",
                day.date.month(),
                day.date.day(),
                day.pillar.name(),
                day.grade.korean(),
                day.score
            ));
        }
        reply.push_str("\n전체 일정표\n");
        for day in &scored {
            reply.push_str(&format!(
                "{}/{} {} {}점\n",
                day.date.month(),
                day.date.day(),
                day.grade.korean(),
                day.score
            ));
        }

        responder.send_text(&reply, &[]).await?;
        self.interests
            .track(key, &interest::classify(text), now)?;
        Ok(())
    }

    /// Daily fortune: deterministic FREE half plus premium unlock buttons.
    async fn run_daily_fortune(
        &self,
        key: &UserKey,
        profile: &Profile,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let now = self.clock.now_kst();
        let pillars = self.pillar.compute(&profile.birth).await?;
        let report = fortune::analyze(&pillars, now.date_naive());

        let free = format!(
            "🔮 오늘의 운세 ({}월 {}일)\n오늘은 {}일, '{}' 기운의 날이에요.\n종합 {}점",
            now.month(),
            now.day(),
            report.today_pillar.name(),
            report.category.korean(),
            report.overall
        );
        let mut premium = String::new();
        for (name, score) in &report.axes {
            premium.push_str(&format!("- {}: {}점\n", name, score));
        }
        premium.push_str(&format!(
            "🍀 행운의 색 {} · 방향 {} · 숫자 {} · 음식 {} · 시간 {}",
            report.lucky.color,
            report.lucky.direction,
            report.lucky.number,
            report.lucky.food,
            report.lucky.time
        ));

        // Persisted in tagged form so the unlock flow can reveal it later.
        let tagged = format!("[FREE]{}[/FREE][PREMIUM]{}[/PREMIUM]", free, premium);
        self.history.append(key, "assistant", &tagged, now)?;

        let display = format!(
            "{}\n\n{}\n{}",
            free,
            blur(&premium, BLUR_MAX_BLOCKS),
            replies::teaser_for(interest::InterestCategory::General)
        );
        let actions = vec![UiAction::new(
            replies::UNLOCK_LABEL,
            replies::UNLOCK_PAYLOAD,
        )];
        responder.send_text(&display, &actions).await?;
        Ok(())
    }

    /// Step 10: general saju question grounded in pillars + year luck +
    /// retrieved classics, with rolling history.
    async fn run_general(
        &self,
        key: &UserKey,
        profile: &Profile,
        question: &str,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let now = self.clock.now_kst();
        self.gate.check(key, Some(profile), &now)?;

        let Some(chat) = self.chat.clone() else {
            responder.send_text(replies::LLM_DISABLED, &[]).await?;
            return Ok(());
        };

        // Independent I/O in parallel: pillar compute ∥ classics retrieval.
        let (pillars, classics) = tokio::join!(
            self.pillar.compute(&profile.birth),
            self.retriever.retrieve(question)
        );
        let pillars = pillars?;
        let structure = analyze_structure(&pillars);
        let luck = analyze_year_luck(&pillars, now.year(), now.month() as u32);

        let history = self.history.recent(key, saju_store::history::DEFAULT_HISTORY_CAP)?;
        let history_msgs: Vec<ChatMessage> = history
            .iter()
            .map(|t| ChatMessage {
                role: if t.role == "assistant" {
                    Role::Assistant
                } else {
                    Role::User
                },
                content: t.content.clone(),
            })
            .collect();

        let pkg = prompt::general_question(question, &pillars, &structure, &luck, &classics, now);
        let request = pkg.into_request(history_msgs);

        let interim = self.spawn_interim(question, now);
        let analysis = async { chat.send(&request).await.map_err(SajuError::from) };
        let response = run_with_progress(Arc::clone(&responder), interim, analysis).await?;
        let content = correct_day_pillar(&response.content, pillars.day);

        self.deliver_paid_reply(key, question, "", &content, responder, now)
            .await
    }

    // ── Shared helpers ───────────────────────────────────────────────────────

    /// Persist the full tagged turn, send FREE + blurred premium + teaser,
    /// then commit quota and interest tracking. History is written only here,
    /// after the analysis succeeded.
    async fn deliver_paid_reply(
        &self,
        key: &UserKey,
        question: &str,
        header: &str,
        content: &str,
        responder: Arc<dyn Responder>,
        now: chrono::DateTime<chrono::FixedOffset>,
    ) -> Result<(), SajuError> {
        self.history.append(key, "user", question, now)?;
        self.history.append(key, "assistant", content, now)?;

        let split = split_reply(content);
        let categories = interest::classify(question);

        let mut display = String::new();
        if !header.is_empty() {
            display.push_str(header);
            display.push_str("\n\n");
        }
        display.push_str(&split.free_text);

        let mut actions = Vec::new();
        if split.has_premium {
            display.push_str("\n\n");
            display.push_str(&blur(&split.premium_text, BLUR_MAX_BLOCKS));
            display.push('\n');
            display.push_str(replies::teaser_for(categories[0]));
            actions.push(UiAction::new(
                replies::UNLOCK_LABEL,
                replies::UNLOCK_PAYLOAD,
            ));
        }

        responder.send_text(&display, &actions).await?;

        self.gate.commit(key, &now)?;
        self.interests.track(key, &categories, now)?;
        Ok(())
    }

    /// Start the interim-message generator immediately so it runs alongside
    /// the main analysis. Returns a future the progress runner awaits after
    /// the 3-second fast path expires. Never counts against the quota.
    fn spawn_interim(
        &self,
        question: &str,
        now: chrono::DateTime<chrono::FixedOffset>,
    ) -> impl std::future::Future<Output = Option<String>> + Send + 'static {
        let chat = self.chat.clone();
        let pkg = prompt::interim(question, now);
        let handle = tokio::spawn(async move {
            let chat = chat?;
            let request = pkg.into_request(Vec::new());
            match chat.send(&request).await {
                Ok(r) if !r.content.trim().is_empty() => Some(r.content.trim().to_string()),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "interim generation failed");
                    None
                }
            }
        });
        async move { handle.await.ok().flatten() }
    }

    /// Single definition of "activity" for the push eligibility window.
    fn record_activity(&self, key: &UserKey, now: &chrono::DateTime<chrono::FixedOffset>) {
        if let Err(e) = self.profiles.touch_activity(key, *now) {
            warn!(user = %key, error = %e, "failed to record activity");
        }
    }

    // ── Callbacks ────────────────────────────────────────────────────────────

    async fn handle_callback(
        &self,
        key: &UserKey,
        data: &str,
        responder: Arc<dyn Responder>,
    ) -> Result<(), SajuError> {
        let now = self.clock.now_kst();

        if data == replies::UNLOCK_PAYLOAD {
            let (reply, actions) = self.unlock_last_premium(key, &now).await?;
            responder.send_text(&reply, &actions).await?;
            self.record_activity(key, &now);
            return Ok(());
        }

        if data == "push_open" {
            if let Some(id) = self.pushlog.latest_id(key)? {
                self.pushlog.mark_opened(id)?;
            }
            if let Some(profile) = self.profiles.get(key)? {
                self.run_daily_fortune(key, &profile, responder).await?;
            }
            self.record_activity(key, &now);
            return Ok(());
        }

        if data == "push_unlock" {
            if let Some(id) = self.pushlog.latest_id(key)? {
                // A tap implies the push was opened.
                self.pushlog.mark_opened(id)?;
                self.pushlog.mark_converted(id)?;
            }
            let (reply, actions) = self.unlock_last_premium(key, &now).await?;
            responder.send_text(&reply, &actions).await?;
            self.record_activity(key, &now);
            return Ok(());
        }

        info!(user = %key, data, "ignoring unknown callback payload");
        Ok(())
    }
}
