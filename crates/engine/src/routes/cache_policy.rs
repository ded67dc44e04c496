use axum::{extract::State, Json};

use crate::EngineState;

/// The normalized cache policy the browser client builds its cache from.
pub async fn handle_cache_policy(State(state): State<EngineState>) -> Json<serde_json::Value> {
    Json(state.cache_policy.as_ref().clone())
}
