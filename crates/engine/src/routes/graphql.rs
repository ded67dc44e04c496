use axum::{extract::State, Extension, Json};

use authn_core::Session;
use federation::{RawRequest, Response};
use tracing_util::{SpanVisibility, Successful};

use crate::EngineState;

pub async fn handle_request(
    State(state): State<EngineState>,
    Extension(session): Extension<Session>,
    Json(request): Json<RawRequest>,
) -> Response {
    let tracer = tracing_util::global_tracer();
    tracer
        .in_span_async(
            "handle_request",
            "Handle request",
            SpanVisibility::User,
            || {
                Box::pin(async move {
                    let response = state.gateway.execute(request, &session).await;
                    if response.does_contain_error() {
                        tracing::debug!(
                            errors = response.body.errors.len(),
                            status = %response.status_code,
                            "operation finished with errors"
                        );
                    }
                    Successful::new(response)
                })
            },
        )
        .await
        .into_inner()
}

/// `OPTIONS /api/graphql`: an empty `200`.
pub async fn handle_preflight() -> reqwest::StatusCode {
    reqwest::StatusCode::OK
}
