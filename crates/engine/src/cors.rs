use axum::http::header::HeaderName;
use reqwest::Method;
use std::time::Duration;
use tower_http::cors;

// Allow tracing headers to be retrievable on responses over CORS.
#[allow(clippy::declare_interior_mutable_const)]
const TRACE_RESPONSE_HEADER_NAMES: [HeaderName; 3] = [
    HeaderName::from_static("traceresponse"),
    HeaderName::from_static("traceparent"),
    HeaderName::from_static("tracestate"),
];

/// Build the CORS layer. An empty `cors_allow_origin` mirrors any origin.
///
/// Credentials are allowed since the browser client authenticates with the
/// session cookie.
pub fn build_cors_layer(cors_allow_origin: &[String]) -> cors::CorsLayer {
    let cors_allow_origin = if cors_allow_origin.is_empty() {
        // Allow all origins and mirror the request origin in 'Access-Control-Allow-Origin'
        cors::AllowOrigin::mirror_request()
    } else {
        let allowed_origins: Vec<String> = cors_allow_origin
            .iter()
            // tolerate comma-space-separated lists: 'val1, val2'
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .collect();
        cors::AllowOrigin::predicate(move |origin_header_value, _req| {
            let origin = origin_header_value.to_str().unwrap_or("");
            allowed_origins.iter().any(|allowed_origin| origin == allowed_origin)
        })
    };
    cors::CorsLayer::new()
        .max_age(Duration::from_secs(24 * 60 * 60)) // 24 hours
        .allow_headers(cors::AllowHeaders::mirror_request())
        .allow_origin(cors_allow_origin)
        .allow_credentials(true)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .expose_headers(TRACE_RESPONSE_HEADER_NAMES)
}
