use std::future::Future;
use std::pin::Pin;

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{
    get_active_span, FutureExt, SpanRef, Status, TraceContextExt, Tracer as _,
};
use opentelemetry::{Key, KeyValue};
use opentelemetry_http::{HeaderExtractor, HeaderInjector};

use crate::traceable::{ErrorVisibility, Traceable, TraceableError};

const INSTRUMENTATION_NAME: &str = "mpdx-gateway";

/// Whether a span is meant for API users or only for operators.
#[derive(Debug, Clone, Copy, derive_more::Display)]
pub enum SpanVisibility {
    #[display("internal")]
    Internal,
    #[display("user")]
    User,
}

#[derive(Debug, Clone, Copy)]
pub enum AttributeVisibility {
    Default,
    /// The key is prefixed with `internal.`
    Internal,
}

fn set_attribute_on_span<V>(
    span: &SpanRef<'_>,
    visibility: AttributeVisibility,
    key: &'static str,
    value: V,
) where
    V: Into<opentelemetry::Value>,
{
    let key: Key = match visibility {
        AttributeVisibility::Default => key.into(),
        AttributeVisibility::Internal => format!("internal.{key}").into(),
    };
    span.set_attribute(KeyValue::new(key, value));
}

fn record_result<R: Traceable>(span: &SpanRef<'_>, visibility: SpanVisibility, result: &R) {
    set_attribute_on_span(
        span,
        AttributeVisibility::Internal,
        "visibility",
        visibility.to_string(),
    );
    let Some(error) = result.get_error() else {
        return;
    };
    let hide_details = matches!(error.visibility(), ErrorVisibility::Internal)
        && matches!(visibility, SpanVisibility::User);
    span.set_status(Status::error(if hide_details {
        "Internal error".to_string()
    } else {
        error.description()
    }));
    set_attribute_on_span(
        span,
        AttributeVisibility::Internal,
        "error_description",
        error.description(),
    );
    set_attribute_on_span(span, AttributeVisibility::Internal, "error_details", error.details());
}

/// Set an attribute on the currently active span.
pub fn set_attribute_on_active_span<V>(visibility: AttributeVisibility, key: &'static str, value: V)
where
    V: Into<opentelemetry::Value>,
{
    get_active_span(|span| set_attribute_on_span(&span, visibility, key, value));
}

/// Convenience wrapper around the globally installed OpenTelemetry tracer.
pub struct Tracer {
    tracer: BoxedTracer,
}

impl Tracer {
    /// Run `f` in a new span named `name`. The span status and error attributes
    /// follow the result of `f`.
    pub fn in_span<R, F>(
        &self,
        name: &'static str,
        display_name: impl Into<String>,
        visibility: SpanVisibility,
        f: F,
    ) -> R
    where
        F: FnOnce() -> R,
        R: Traceable,
    {
        let display_name = display_name.into();
        self.tracer.in_span(name, |cx| {
            let result = f();
            let span = cx.span();
            set_attribute_on_span(
                &span,
                AttributeVisibility::Default,
                "display.name",
                display_name,
            );
            record_result(&span, visibility, &result);
            result
        })
    }

    /// Async version of [`Tracer::in_span`]. `f` returns a boxed future so that
    /// callers do not instantiate this function for every future type.
    pub async fn in_span_async<'a, R, F>(
        &'a self,
        name: &'static str,
        display_name: impl Into<String>,
        visibility: SpanVisibility,
        f: F,
    ) -> R
    where
        F: FnOnce() -> Pin<Box<dyn Future<Output = R> + 'a + Send>>,
        R: Traceable,
    {
        let display_name = display_name.into();
        self.tracer
            .in_span(name, |cx| {
                async move {
                    let result = f().await;
                    get_active_span(|span| {
                        set_attribute_on_span(
                            &span,
                            AttributeVisibility::Default,
                            "display.name",
                            display_name,
                        );
                        record_result(&span, visibility, &result);
                    });
                    result
                }
                .with_context(cx)
            })
            .await
    }

    /// Like [`Tracer::in_span_async`], continuing the trace found in the
    /// `traceparent` header of an incoming request, if any.
    pub async fn in_span_async_with_parent_context<'a, R, F>(
        &'a self,
        name: &'static str,
        display_name: impl Into<String>,
        visibility: SpanVisibility,
        parent_headers: &http::HeaderMap,
        f: F,
    ) -> R
    where
        F: FnOnce() -> Pin<Box<dyn Future<Output = R> + 'a + Send>>,
        R: Traceable,
    {
        let parent = global::get_text_map_propagator(|propagator| {
            propagator.extract(&HeaderExtractor(parent_headers))
        });
        if parent.span().span_context().is_valid() {
            self.in_span_async(name, display_name, visibility, f)
                .with_context(parent)
                .await
        } else {
            self.in_span_async(name, display_name, visibility, f).await
        }
    }
}

pub fn global_tracer() -> Tracer {
    Tracer {
        tracer: global::tracer(INSTRUMENTATION_NAME),
    }
}

/// Headers carrying the current trace context, to be sent along with outgoing
/// HTTP requests.
pub fn get_trace_headers() -> http::HeaderMap {
    let mut headers = http::HeaderMap::new();
    global::get_text_map_propagator(|propagator| {
        propagator.inject(&mut HeaderInjector(&mut headers));
    });
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Successful;

    #[tokio::test]
    async fn test_in_span_async_returns_the_result() {
        let tracer = global_tracer();
        let result = tracer
            .in_span_async("test", "Test span", SpanVisibility::Internal, || {
                Box::pin(async { Successful::new(40 + 2) })
            })
            .await;
        assert_eq!(result.into_inner(), 42);
    }

    #[test]
    fn test_trace_headers_without_active_span() {
        // The no-op propagator installed by default injects nothing.
        assert!(get_trace_headers().get("traceparent").is_none());
    }
}
