//! Kakao skill endpoint. The builder treats any non-200 (or malformed body)
//! as a hard failure and swaps in its own fallback block — so this route
//! answers HTTP 200 with a simpleText body no matter what went wrong.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;
use tracing::warn;

use saju_kakao::types::{SkillRequest, SkillResponse};

use crate::app::AppState;

const SECRET_HEADER: &str = "x-skill-secret";

pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn skill_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    // Secret accepted from header OR query string. An empty configured
    // secret passes everything through (flagged at startup).
    let expected = state
        .config
        .kakao
        .as_ref()
        .and_then(|k| k.skill_secret.as_deref())
        .unwrap_or("");
    if !expected.is_empty() {
        let from_header = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let from_query = query.get("secret").map(String::as_str).unwrap_or("");
        if from_header != expected && from_query != expected {
            warn!("kakao skill secret mismatch");
            return error_bubble("인증에 실패했어요. 설정을 확인해 주세요.");
        }
    }

    let request: SkillRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "malformed kakao skill request");
            return error_bubble("요청을 읽지 못했어요. 잠시 후 다시 시도해 주세요.");
        }
    };

    let response = saju_kakao::handle_skill_request(
        Arc::clone(&state.kakao),
        Arc::clone(&state.orch),
        request,
    )
    .await;
    Json(response)
}

fn error_bubble(text: &str) -> Json<Value> {
    let resp = SkillResponse::from_text(text, &[]);
    Json(serde_json::to_value(resp).unwrap_or(Value::Null))
}
