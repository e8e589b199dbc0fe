use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (saju.toml + SAJU_* env overrides + well-known bare env
/// vars). Every external subsystem is optional: a missing section disables
/// the dependent feature instead of failing startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SajuConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub kakao: Option<KakaoConfig>,
    #[serde(default)]
    pub pillar_api: Option<PillarApiConfig>,
    /// Secret for the 08:00 KST cron trigger endpoint.
    #[serde(default)]
    pub cron_secret: Option<String>,
}

impl Default for SajuConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            openai: None,
            telegram: None,
            kakao: None,
            pillar_api: None,
            cron_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Empty path means in-memory only (no persistence across restarts).
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Compared against `X-Telegram-Bot-Api-Secret-Token` on the webhook.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KakaoConfig {
    /// Accepted from header or query string. An empty/missing secret passes
    /// every request through — surfaced as a startup warning.
    #[serde(default)]
    pub skill_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarApiConfig {
    /// Base URL of the external pillar computation service (no trailing slash).
    pub base_url: String,
}

fn default_port() -> u16 {
    8410
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.saju/saju.db", home)
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

impl SajuConfig {
    /// Load from a TOML file with SAJU_* env overrides, then fill gaps from
    /// the well-known bare env names (OPENAI_API_KEY, TELEGRAM_BOT_TOKEN, …).
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let mut config: SajuConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("SAJU_").split("_"))
            .extract()
            .map_err(|e| crate::error::SajuError::Internal(format!("config: {}", e)))?;

        config.apply_well_known_env();
        Ok(config)
    }

    /// Bare env names take effect only where the file/prefixed env left gaps.
    pub fn apply_well_known_env(&mut self) {
        if self.openai.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                if !key.is_empty() {
                    self.openai = Some(OpenAiConfig {
                        api_key: key,
                        model: std::env::var("OPENAI_MODEL")
                            .ok()
                            .filter(|m| !m.is_empty())
                            .unwrap_or_else(default_model),
                        embedding_model: default_embedding_model(),
                        base_url: default_openai_base_url(),
                    });
                }
            }
        }
        if self.telegram.is_none() {
            if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
                if !token.is_empty() {
                    self.telegram = Some(TelegramConfig {
                        bot_token: token,
                        webhook_secret: std::env::var("TELEGRAM_WEBHOOK_SECRET")
                            .ok()
                            .filter(|s| !s.is_empty()),
                    });
                }
            }
        }
        if self.kakao.is_none() {
            // The Kakao endpoint works secretless; only materialise the
            // section when the secret env is present so the route stays off
            // by default outside of explicit config.
            if let Ok(secret) = std::env::var("KAKAO_SKILL_SECRET") {
                self.kakao = Some(KakaoConfig {
                    skill_secret: Some(secret).filter(|s| !s.is_empty()),
                });
            }
        }
        if self.pillar_api.is_none() {
            if let Ok(url) = std::env::var("PILLAR_API_URL") {
                if !url.is_empty() {
                    self.pillar_api = Some(PillarApiConfig {
                        base_url: url.trim_end_matches('/').to_string(),
                    });
                }
            }
        }
        if self.cron_secret.is_none() {
            self.cron_secret = std::env::var("CRON_SECRET")
                .ok()
                .filter(|s| !s.is_empty());
        }
    }

    /// One log line per disabled subsystem, emitted at startup.
    pub fn log_disabled_features(&self) {
        if self.openai.is_none() {
            tracing::warn!("no OpenAI key configured — LLM replies disabled");
        }
        if self.telegram.is_none() {
            tracing::warn!("no Telegram token configured — Telegram channel disabled");
        }
        if self.kakao.is_none() {
            tracing::warn!("no Kakao section configured — Kakao skill endpoint disabled");
        } else if self
            .kakao
            .as_ref()
            .map(|k| k.skill_secret.as_deref().unwrap_or("").is_empty())
            .unwrap_or(false)
        {
            tracing::warn!("kakao.skill_secret is empty — skill endpoint accepts all requests");
        }
        if self.pillar_api.is_none() {
            tracing::info!("no pillar API URL — using local pillar calculator only");
        }
        if self.cron_secret.is_none() {
            tracing::warn!("no CRON_SECRET — daily push trigger endpoint disabled");
        }
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.saju/saju.toml", home)
}
