//! Health and runtime diagnostics endpoints.

use crate::AppState;
use axum::{Extension, Json};
use leadline_types::LeadType;
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /diag_runtime
///
/// Effective dialogue and dispatch settings. Assignment URLs are reported
/// only as configured or not.
pub async fn diag_runtime(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let settings = &state.dialogue.settings;
    let targets = state.dispatcher.targets();
    Json(json!({
        "language": settings.language,
        "lexicon": state.dialogue.lexicon.language(),
        "speak_sleep_ms": state.speak_sleep.as_millis() as u64,
        "cooldown_ms": settings.cooldown.as_millis() as u64,
        "premature_phone_min_digits": settings.premature_phone_min_digits,
        "knowledge_topics": state.dialogue.knowledge.topics().len(),
        "assign": {
            "default": targets.default.is_some(),
            "prospect": targets.prospect.is_some(),
            "support": targets.support.is_some(),
            "lead_routed": targets.url_for(LeadType::Lead).is_some(),
            "timeout_ms": state.dispatcher.timeout().as_millis() as u64,
        },
        "handoff_number": settings.handoff_number,
    }))
}
