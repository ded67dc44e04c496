mod cache_policy;
mod graphql;
mod rest_subgraph;

pub use cache_policy::handle_cache_policy;
pub use graphql::{handle_preflight, handle_request};
pub use rest_subgraph::handle_rest_subgraph_request;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::rest_subgraph_request_tracing_middleware;
use crate::state::REST_SUBGRAPH_PATH;
use crate::{
    authentication_middleware, build_cors_layer, graphql_request_tracing_middleware, EngineState,
};

const MB: usize = 1_048_576;

/// The main router for the engine.
pub struct EngineRouter {
    /// Contains /api/graphql, /api/graphql-rest, /api/cache-policy and /health.
    base_router: Router,
    cors_layer: Option<CorsLayer>,
}

impl EngineRouter {
    pub fn new(state: EngineState) -> Self {
        let graphql_route = Router::new()
            .route(
                "/api/graphql",
                post(handle_request)
                    .layer(axum::middleware::from_fn_with_state(
                        state.clone(),
                        authentication_middleware,
                    ))
                    // preflights are answered without a session
                    .options(handle_preflight),
            )
            .layer(axum::middleware::from_fn(
                graphql_request_tracing_middleware,
            ))
            // *PLEASE DO NOT ADD ANY MIDDLEWARE
            // BEFORE THE `graphql_request_tracing_middleware`*
            // Refer to it for more details.
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let rest_subgraph_route = Router::new()
            .route(REST_SUBGRAPH_PATH, post(handle_rest_subgraph_request))
            .layer(axum::middleware::from_fn(
                rest_subgraph_request_tracing_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let cache_policy_route = Router::new()
            .route("/api/cache-policy", get(handle_cache_policy))
            .with_state(state);

        let health_route = Router::new().route("/health", get(handle_health));

        let base_router = Router::new()
            .merge(graphql_route)
            .merge(rest_subgraph_route)
            .merge(cache_policy_route)
            .merge(health_route)
            // Set request payload limit to 10 MB
            .layer(DefaultBodyLimit::max(10 * MB));

        Self {
            base_router,
            cors_layer: None,
        }
    }

    pub fn add_cors_layer(&mut self, allow_origin: &[String]) {
        self.cors_layer = Some(build_cors_layer(allow_origin));
    }

    pub fn into_router(self) -> Router {
        let mut app = self.base_router;
        if let Some(cors_layer) = self.cors_layer {
            // It is important that this layer is added last, since it only affects
            // the layers that precede it.
            app = app.layer(cors_layer);
        }
        app
    }

    pub fn into_make_service(self) -> axum::routing::IntoMakeService<Router> {
        self.into_router().into_make_service()
    }
}

/// Health check endpoint
async fn handle_health() -> reqwest::StatusCode {
    reqwest::StatusCode::OK
}
