use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
};
use tracing_util::{
    get_text_map_propagator, set_attribute_on_active_span, AttributeVisibility, Context,
    HeaderInjector, SpanVisibility, Successful, TraceableHttpResponse,
};

use crate::{EngineState, VERSION};

/// Middleware to start tracing of a request to `path`.
/// This middleware must be active for the entire duration
/// of the request i.e. this middleware should be the
/// entry point and the exit point of the request.
async fn request_tracing(
    path: &'static str,
    request: Request<Body>,
    next: Next,
) -> axum::response::Response {
    let tracer = tracing_util::global_tracer();
    tracer
        .in_span_async_with_parent_context(
            path,
            path,
            SpanVisibility::User,
            &request.headers().clone(),
            || {
                set_attribute_on_active_span(AttributeVisibility::Internal, "version", VERSION);
                Box::pin(async move {
                    let mut response = next.run(request).await;
                    get_text_map_propagator(|propagator| {
                        propagator.inject_context(
                            &Context::current(),
                            &mut HeaderInjector(response.headers_mut()),
                        );
                    });
                    TraceableHttpResponse::new(response, path)
                })
            },
        )
        .await
        .response
}

pub async fn graphql_request_tracing_middleware(
    request: Request<Body>,
    next: Next,
) -> axum::response::Response {
    request_tracing("/api/graphql", request, next).await
}

pub async fn rest_subgraph_request_tracing_middleware(
    request: Request<Body>,
    next: Next,
) -> axum::response::Response {
    request_tracing(crate::state::REST_SUBGRAPH_PATH, request, next).await
}

/// This middleware reads the session token of the incoming request and makes
/// the resulting `authn_core::Session` available to the GraphQL handler.
///
/// A missing or invalid token never rejects the request: it is executed
/// anonymously and the remote API decides what an anonymous caller may see.
pub async fn authentication_middleware(
    State(state): State<EngineState>,
    headers_map: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> axum::response::Response {
    let tracer = tracing_util::global_tracer();
    let session = tracer
        .in_span_async(
            "authentication_middleware",
            "Authentication middleware",
            SpanVisibility::Internal,
            || {
                Box::pin(async {
                    Successful::new(
                        authn_jwt::session_or_anonymous(&state.jwt_config, &headers_map).await,
                    )
                })
            },
        )
        .await
        .into_inner();

    request.extensions_mut().insert(session);
    next.run(request).await
}
