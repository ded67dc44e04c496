use opentelemetry::global;
use opentelemetry::trace::TraceError;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_semantic_conventions as semcov;
use tracing_subscriber::EnvFilter;

/// Whether spans are also printed to stdout
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportTracesStdout {
    Enable,
    Disable,
}

#[derive(Debug, Clone)]
pub struct TracingConfig<'a> {
    /// OTLP (gRPC) collector endpoint. No spans are exported over OTLP without one.
    pub otlp_endpoint: Option<&'a str>,
    pub service_name: String,
    pub service_version: Option<&'static str>,
    pub export_traces_stdout: ExportTracesStdout,
}

/// Install the log subscriber, the W3C trace context propagator and the global
/// tracer provider.
///
/// Logs go through `tracing-subscriber` filtered by `RUST_LOG` (default
/// `info`). Spans are batched to the OTLP endpoint when one is configured and
/// printed to stdout on request.
pub fn initialize_tracing(config: TracingConfig<'_>) -> Result<(), TraceError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // a subscriber may already be installed, e.g. in tests
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    global::set_text_map_propagator(TraceContextPropagator::new());

    let mut resource = vec![KeyValue::new(semcov::resource::SERVICE_NAME, config.service_name)];
    if let Some(version) = config.service_version {
        resource.push(KeyValue::new(semcov::resource::SERVICE_VERSION, version));
    }
    let mut builder = TracerProvider::builder().with_config(
        opentelemetry_sdk::trace::Config::default()
            .with_resource(opentelemetry_sdk::Resource::new(resource)),
    );

    if let Some(endpoint) = config.otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporterBuilder::Tonic(
            opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint),
        )
        .build_span_exporter()?;
        builder = builder.with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio);
    }

    if config.export_traces_stdout == ExportTracesStdout::Enable {
        builder = builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default());
    }

    global::set_tracer_provider(builder.build());
    Ok(())
}

/// Flush and shut down the global tracer provider.
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}
