mod http;
mod setup;
mod traceable;
mod tracer;

pub use crate::http::TraceableHttpResponse;
pub use setup::{initialize_tracing, shutdown_tracer, ExportTracesStdout, TracingConfig};
pub use traceable::{ErrorVisibility, Successful, Traceable, TraceableError};
pub use tracer::{
    get_trace_headers, global_tracer, set_attribute_on_active_span, AttributeVisibility,
    SpanVisibility, Tracer,
};

// re-exported so that users share our OpenTelemetry version and globals
pub use opentelemetry::global::get_text_map_propagator;
pub use opentelemetry::Context;
pub use opentelemetry_http::HeaderInjector;
