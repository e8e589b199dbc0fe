//! 08:00 KST push trigger. Fired by an external clock (platform cron); the
//! fan-out itself runs to completion before the response so the caller's
//! logs carry the aggregate counts.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::app::AppState;

const SECRET_HEADER: &str = "x-cron-secret";

pub async fn daily_push_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(expected) = state.config.cron_secret.as_deref() else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "cron trigger is disabled"})),
        ));
    };

    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if presented != expected {
        warn!("cron secret mismatch");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "bad cron secret"})),
        ));
    }

    let summary = state.push.run().await;
    Ok(Json(json!({
        "ok": true,
        "total": summary.total,
        "success": summary.success,
        "failed": summary.failed,
    })))
}
