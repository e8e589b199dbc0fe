use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "llm": state.chat.is_some(),
        "telegram": state.telegram.is_some(),
        "kakao": state.config.kakao.is_some(),
        "pillar_api": state.config.pillar_api.is_some(),
    }))
}
