use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};

use authn_core::bearer_token_from_headers;
use rest_client::RestApi;

use crate::EngineState;

/// The rest subgraph over HTTP, authenticated by the `Authorization: Bearer`
/// header the gateway forwards.
pub async fn handle_rest_subgraph_request(
    headers: HeaderMap,
    State(state): State<EngineState>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let rest: Arc<dyn RestApi> = Arc::new(
        state
            .rest_client
            .with_token(bearer_token_from_headers(&headers)),
    );
    Json(state.rest_subgraph.execute(request, rest).await)
}
