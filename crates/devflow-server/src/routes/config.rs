use axum::extract::State;
use axum::Json;
use devflow_core::config::AiConfig;

use crate::state::AppState;

/// GET /api/config: the loaded configuration plus validation warnings.
/// The API key itself is never returned.
pub async fn get_config(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "config": app.config.as_ref(),
        "api_key_configured": AiConfig::api_key().is_some(),
        "warnings": app.config.validate(),
    }))
}
