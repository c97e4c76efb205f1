use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version plus whether a tenant context is live.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.manager.snapshot();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "tenantd",
        "tenant": snapshot.context.slug(),
        "initialized": snapshot.initialized,
        "rules": state.engine.rule_names(),
        "cachedTransforms": state.engine.cache_len(),
    }))
}
