// Handlers HTTP: health e superfície de ferramentas
pub mod health;
pub mod tools;

pub use health::*;
pub use tools::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use slack_lists_middleware::AppState;

/// Rotas do serviço
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status_check))
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(call_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
