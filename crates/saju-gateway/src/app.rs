use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;

use saju_classics::{ClassicsChunk, ClassicsIndex, ClassicsRetriever, Source};
use saju_core::clock::{KstClock, SystemClock};
use saju_core::config::SajuConfig;
use saju_kakao::KakaoAdapter;
use saju_llm::openai::OpenAiClient;
use saju_llm::provider::{ChatProvider, EmbeddingProvider};
use saju_orchestrator::Orchestrator;
use saju_pillars::remote::PillarApiClient;
use saju_pillars::PillarService;
use saju_push::{DailyPushScheduler, PushChannel};
use saju_store::classics::ClassicsStore;
use saju_store::interests::InterestStore;
use saju_store::pillar_cache::SqlitePillarCache;
use saju_store::profiles::ProfileStore;
use saju_store::pushlog::PushLogStore;
use saju_telegram::TelegramChannel;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: SajuConfig,
    pub clock: Arc<dyn KstClock>,
    pub orch: Arc<Orchestrator>,
    pub pillar: Arc<PillarService>,
    pub chat: Option<Arc<dyn ChatProvider>>,
    pub telegram: Option<Arc<TelegramChannel>>,
    pub kakao: Arc<KakaoAdapter>,
    pub push: Arc<DailyPushScheduler>,
}

impl AppState {
    /// Wire every subsystem from config. Missing keys disable features
    /// rather than failing startup.
    pub fn build(config: SajuConfig) -> saju_store::Result<Self> {
        let db = saju_store::open_db(&config.database.path)?;
        let clock: Arc<dyn KstClock> = Arc::new(SystemClock);

        // LLM + embeddings share the one OpenAI-compatible client.
        let openai = config.openai.as_ref().map(|c| {
            Arc::new(OpenAiClient::new(
                c.api_key.clone(),
                c.base_url.trim_end_matches('/').to_string(),
                c.model.clone(),
                c.embedding_model.clone(),
            ))
        });
        let chat: Option<Arc<dyn ChatProvider>> =
            openai.as_ref().map(|c| Arc::clone(c) as Arc<dyn ChatProvider>);
        let embedder: Option<Arc<dyn EmbeddingProvider>> =
            openai.as_ref().map(|c| Arc::clone(c) as Arc<dyn EmbeddingProvider>);

        // Pillar computation: remote-first when configured, durable cache.
        let remote = config
            .pillar_api
            .as_ref()
            .map(|c| PillarApiClient::new(c.base_url.clone()));
        let cache = Arc::new(SqlitePillarCache::new(db.clone()));
        let pillar = Arc::new(PillarService::new(remote, cache));

        // Classics corpus: loaded once into the in-memory index.
        let chunks = ClassicsStore::new(db.clone()).load_all()?;
        let index = ClassicsIndex::new(
            chunks
                .into_iter()
                .filter_map(|row| {
                    Some(ClassicsChunk {
                        source: row.source.parse::<Source>().ok()?,
                        section: row.section,
                        content: row.content,
                        embedding: row.embedding,
                    })
                })
                .collect(),
        );
        info!(chunks = index.len(), "classics index loaded");
        let retriever = Arc::new(ClassicsRetriever::new(Arc::new(index), embedder));

        let orch = Arc::new(Orchestrator::new(
            db.clone(),
            Arc::clone(&pillar),
            retriever,
            chat.clone(),
            Arc::clone(&clock),
        ));

        let telegram = config
            .telegram
            .as_ref()
            .map(|c| Arc::new(TelegramChannel::new(&c.bot_token)));

        let mut channels: Vec<Arc<dyn PushChannel>> = Vec::new();
        if let Some(tg) = &telegram {
            channels.push(Arc::clone(tg) as Arc<dyn PushChannel>);
        }
        let push = Arc::new(DailyPushScheduler {
            profiles: Arc::new(ProfileStore::new(db.clone())),
            interests: Arc::new(InterestStore::new(db.clone())),
            pushlog: Arc::new(PushLogStore::new(db)),
            pillar: Arc::clone(&pillar),
            chat: chat.clone(),
            clock: Arc::clone(&clock),
            channels,
        });

        Ok(Self {
            config,
            clock,
            orch,
            pillar,
            chat,
            telegram,
            kakao: Arc::new(KakaoAdapter::new()),
            push,
        })
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/webhooks/telegram",
            post(crate::http::telegram::webhook_handler),
        )
        .route(
            "/kakao/skill",
            post(crate::http::kakao::skill_handler)
                .options(crate::http::kakao::preflight_handler)
                .head(crate::http::kakao::preflight_handler),
        )
        .route("/cron/daily-push", post(crate::http::cron::daily_push_handler))
        .route("/api/saju", post(crate::http::report::saju_handler))
        .route("/api/report", post(crate::http::report::report_handler))
        .with_state(state)
        // The report route accepts a face image up to 5MB plus text parts.
        .layer(axum::extract::DefaultBodyLimit::max(8 * 1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
