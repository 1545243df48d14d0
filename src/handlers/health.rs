use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use slack_lists_middleware::utils::logging::*;
use slack_lists_middleware::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "slack-lists-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Configuração efetiva (sem token) e ferramentas disponíveis
pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_health_check();

    let config = state.operations.config();
    let retry = config.retry_policy();

    Json(json!({
        "service": "slack-lists-middleware",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "slack": {
            "base_url": config.base_url(),
            "default_list_id": config.default_list_id(),
            "token_configured": !config.token().is_empty(),
            "max_attempts": retry.max_attempts(),
            "attempt_timeout_secs": retry.attempt_timeout().as_secs()
        },
        "tools": super::tools::TOOL_NAMES.len()
    }))
}
