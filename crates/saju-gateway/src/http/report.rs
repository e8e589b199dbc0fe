//! Web API endpoints: JSON saju analysis and the multipart integrated
//! report. Web requests are profile-less — the birth tuple rides in the
//! request — and run under a 90-second hard deadline.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use saju_core::clock::KstClock;
use saju_core::types::{BirthInfo, Gender};
use saju_llm::correction::correct_day_pillar;
use saju_llm::freemium::split_reply;
use saju_llm::prompt;
use saju_pillars::luck::analyze_year_luck;
use saju_pillars::strength::analyze_structure;

use crate::app::AppState;

const ANALYSIS_DEADLINE: Duration = Duration::from_secs(90);
const MAX_TEXT_BYTES: usize = 500_000;
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_IMAGE_MIME: [&str; 4] = ["image/jpeg", "image/png", "image/heic", "image/heif"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SajuRequest {
    pub birth_year: i32,
    pub birth_month: u32,
    pub birth_day: u32,
    #[serde(default = "default_hour")]
    pub birth_hour: u32,
    #[serde(default)]
    pub birth_minute: u32,
    pub gender: String,
    #[serde(default)]
    pub question: String,
}

fn default_hour() -> u32 {
    12
}

impl SajuRequest {
    fn birth(&self) -> Result<BirthInfo, String> {
        let gender: Gender = self.gender.parse()?;
        let birth = BirthInfo {
            year: self.birth_year,
            month: self.birth_month,
            day: self.birth_day,
            hour: self.birth_hour,
            minute: self.birth_minute,
            gender,
        };
        birth.validate()?;
        Ok(birth)
    }
}

pub async fn saju_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SajuRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let birth = req
        .birth()
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({"error": e}))))?;

    match tokio::time::timeout(ANALYSIS_DEADLINE, analyze(&state, &birth, &req.question)).await {
        Ok(result) => result.map(Json).map_err(|e| {
            warn!(error = %e, "web saju analysis failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "analysis failed"})),
            )
        }),
        Err(_) => Err((
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({"error": "analysis deadline exceeded"})),
        )),
    }
}

async fn analyze(
    state: &AppState,
    birth: &BirthInfo,
    question: &str,
) -> Result<Value, saju_core::error::SajuError> {
    let now = state.clock.now_kst();
    let question = if question.trim().is_empty() {
        "전반적인 사주 풀이를 해주세요"
    } else {
        question
    };

    let (pillars, classics) = tokio::join!(
        state.pillar.compute(birth),
        state.orch.retriever.retrieve(question)
    );
    let pillars = pillars?;
    let structure = analyze_structure(&pillars);
    let luck = analyze_year_luck(&pillars, now.year(), now.month());

    let reading = match &state.chat {
        Some(chat) => {
            let pkg =
                prompt::general_question(question, &pillars, &structure, &luck, &classics, now);
            let request = pkg.into_request(Vec::new());
            let response = chat.send(&request).await.map_err(saju_core::error::SajuError::from)?;
            let corrected = correct_day_pillar(&response.content, pillars.day);
            let split = split_reply(&corrected);
            json!({
                "free": split.free_text,
                "premium": split.premium_text,
                "hasPremium": split.has_premium,
            })
        }
        None => json!({
            "free": "AI 풀이 기능이 비활성화되어 있어요.",
            "premium": "",
            "hasPremium": false,
        }),
    };

    Ok(json!({
        "chart": pillars.chart_line(),
        "structure": {
            "label": structure.label.korean(),
            "score": structure.score(),
            "distribution": structure.distribution_lines(),
        },
        "yearLuck": {
            "year": luck.year,
            "yearPillar": luck.year_pillar.name(),
            "yukchin": luck.year_stem_yukchin.korean(),
            "impact": luck.element_impact,
        },
        "reading": reading,
    }))
}

/// Multipart integrated report: birth fields + question + optional chat
/// exports and face image. Oversized or mistyped parts are rejected before
/// any analysis runs.
pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut fields: std::collections::HashMap<String, String> = std::collections::HashMap::new();
    let mut face_image_bytes: usize = 0;
    let mut face_consent = false;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "faceImage" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                if !ALLOWED_IMAGE_MIME.contains(&content_type.as_str()) {
                    return Err((
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        Json(json!({"error": format!("unsupported image type: {}", content_type)})),
                    ));
                }
                let bytes = field.bytes().await.map_err(bad_request)?;
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err((
                        StatusCode::PAYLOAD_TOO_LARGE,
                        Json(json!({"error": "face image exceeds 5MB"})),
                    ));
                }
                face_image_bytes = bytes.len();
            }
            "faceConsent" => {
                let text = field.text().await.map_err(bad_request)?;
                face_consent = text == "true" || text == "1";
            }
            "kakaoText" | "aiChatText" => {
                let bytes = field.bytes().await.map_err(bad_request)?;
                if bytes.len() > MAX_TEXT_BYTES {
                    return Err((
                        StatusCode::PAYLOAD_TOO_LARGE,
                        Json(json!({"error": format!("{} exceeds 500KB", name)})),
                    ));
                }
                let text = String::from_utf8_lossy(&bytes).to_string();
                fields.insert(name, text);
            }
            _ => {
                let text = field.text().await.map_err(bad_request)?;
                fields.insert(name, text);
            }
        }
    }

    let get_num = |key: &str| -> Result<u32, (StatusCode, Json<Value>)> {
        fields
            .get(key)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": format!("missing or invalid field: {}", key)})),
                )
            })
    };

    let req = SajuRequest {
        birth_year: get_num("birthYear")? as i32,
        birth_month: get_num("birthMonth")?,
        birth_day: get_num("birthDay")?,
        birth_hour: fields
            .get("birthHour")
            .and_then(|v| v.parse().ok())
            .unwrap_or(12),
        birth_minute: fields
            .get("birthMinute")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        gender: fields.get("gender").cloned().unwrap_or_default(),
        question: fields.get("question").cloned().unwrap_or_default(),
    };
    let birth = req
        .birth()
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({"error": e}))))?;

    let analysis =
        match tokio::time::timeout(ANALYSIS_DEADLINE, analyze(&state, &birth, &req.question)).await
        {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                warn!(error = %e, "report analysis failed");
                return Err((
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": "analysis failed"})),
                ));
            }
            Err(_) => {
                return Err((
                    StatusCode::GATEWAY_TIMEOUT,
                    Json(json!({"error": "analysis deadline exceeded"})),
                ));
            }
        };

    Ok(Json(json!({
        "analysis": analysis,
        "inputs": {
            "kakaoTextReceived": fields.contains_key("kakaoText"),
            "aiChatTextReceived": fields.contains_key("aiChatText"),
            "faceImageBytes": face_image_bytes,
            "faceConsent": face_consent,
        },
    })))
}

fn bad_request<E: std::fmt::Display>(e: E) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": e.to_string()})),
    )
}
