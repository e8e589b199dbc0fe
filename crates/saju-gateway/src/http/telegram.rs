//! Telegram webhook ingress. The update is ACKed immediately and processed
//! in a spawned task — Telegram retries slow webhooks aggressively.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::app::AppState;

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(channel) = state.telegram.clone() else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "telegram channel is disabled"})),
        ));
    };

    // Shared-secret header configured at setWebhook time.
    if let Some(expected) = state
        .config
        .telegram
        .as_ref()
        .and_then(|t| t.webhook_secret.as_deref())
    {
        let presented = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != expected {
            warn!("telegram webhook secret mismatch");
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "bad webhook secret"})),
            ));
        }
    }

    // Unknown or unsupported payloads are ACKed without processing so
    // Telegram stops retrying them.
    let update: teloxide::types::Update = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            debug!(error = %e, "unparseable telegram update — acked");
            return Ok(Json(json!({"ok": true})));
        }
    };

    let orch = Arc::clone(&state.orch);
    tokio::spawn(async move {
        channel.process_update(orch, update).await;
    });

    Ok(Json(json!({"ok": true})))
}
