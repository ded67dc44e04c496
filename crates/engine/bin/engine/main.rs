use clap::Parser;
use engine::{build_state, EngineConfig, EngineRouter, StartupError, VERSION};
use federation::ExposeInternalErrors;
use serde::Serialize;
use std::net;
use std::time::Duration;
use tracing_util::{set_attribute_on_active_span, SpanVisibility};

static DEFAULT_OTEL_SERVICE_NAME: &str = "mpdx-graphql-gateway";
const DEFAULT_PORT: u16 = 3000;

#[allow(clippy::struct_excessive_bools)] // booleans are pretty useful here
#[derive(Parser, Serialize)]
#[command(version = VERSION)]
struct ServerOptions {
    /// The remote GraphQL API that owns every root field not served by the rest subgraph.
    #[arg(long, value_name = "URL", env = "API_URL")]
    api_url: String,
    /// Base URL of the REST (JSON:API) backend.
    #[arg(long, value_name = "URL", env = "REST_API_URL")]
    rest_api_url: String,
    /// The public URL of the site. Hosts the HTTP rest subgraph and is the
    /// default CORS origin.
    #[arg(long, value_name = "URL", env = "SITE_URL")]
    site_url: String,
    /// Secret the session token is signed with.
    #[serde(skip)]
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,
    /// Seconds of clock skew tolerated when checking the session token's expiry.
    #[arg(long, value_name = "SECONDS", env = "JWT_LEEWAY_SECONDS", default_value_t = 0)]
    jwt_leeway_seconds: u64,
    /// Timeout of every request to the remote API and the REST backend.
    #[arg(long, value_name = "SECONDS", env = "UPSTREAM_TIMEOUT_SECONDS", default_value_t = 60)]
    upstream_timeout_seconds: u64,
    /// Reach the rest subgraph over HTTP at `SITE_URL/api/graphql-rest`
    /// instead of executing it in-process.
    #[arg(long, env = "REST_SUBGRAPH_OVER_HTTP")]
    rest_subgraph_over_http: bool,
    /// The OpenTelemetry collector endpoint.
    #[arg(long, value_name = "URL", env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,
    /// The host IP on which the server listens, defaulting to all IPv4 and IPv6 addresses.
    #[arg(
        long,
        value_name = "HOST",
        env = "HOST",
        default_value_t = net::IpAddr::V6(net::Ipv6Addr::UNSPECIFIED)
    )]
    host: net::IpAddr,
    /// The port on which the server listens.
    #[arg(long, value_name = "PORT", env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Enable CORS. Support preflight request and include related headers in responses.
    #[arg(long, env = "ENABLE_CORS")]
    enable_cors: bool,
    /// The list of allowed origins for CORS. Defaults to `SITE_URL`.
    /// Requires `--enable-cors` to be set.
    #[arg(
        long,
        value_name = "ORIGIN_LIST",
        env = "CORS_ALLOW_ORIGIN",
        requires = "enable_cors",
        value_delimiter = ','
    )]
    cors_allow_origin: Vec<String>,
    /// Whether internal errors should be shown or censored.
    /// It is recommended to only show errors while developing since internal errors may contain
    /// sensitve information.
    #[arg(long, env = "EXPOSE_INTERNAL_ERRORS")]
    expose_internal_errors: bool,
    /// Log traces to stdout.
    #[arg(long, env = "EXPORT_TRACES_STDOUT")]
    export_traces_stdout: bool,
    /// Service name output in OpenTelemetry traces
    #[arg(long, env = "OTEL_SERVICE_NAME")]
    otel_service_name: Option<String>,
}

impl ServerOptions {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            api_url: self.api_url.clone(),
            rest_api_url: self.rest_api_url.clone(),
            site_url: self.site_url.clone(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_leeway: self.jwt_leeway_seconds,
            upstream_timeout: Duration::from_secs(self.upstream_timeout_seconds),
            rest_subgraph_over_http: self.rest_subgraph_over_http,
            expose_internal_errors: if self.expose_internal_errors {
                ExposeInternalErrors::Expose
            } else {
                ExposeInternalErrors::Censor
            },
        }
    }

    fn cors_allow_origin(&self) -> Vec<String> {
        if self.cors_allow_origin.is_empty() {
            vec![self.site_url.clone()]
        } else {
            self.cors_allow_origin.clone()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server_options = ServerOptions::parse();
    let export_traces_stdout = if server_options.export_traces_stdout {
        tracing_util::ExportTracesStdout::Enable
    } else {
        tracing_util::ExportTracesStdout::Disable
    };

    tracing_util::initialize_tracing(tracing_util::TracingConfig {
        otlp_endpoint: server_options.otlp_endpoint.as_deref(),
        service_name: server_options
            .otel_service_name
            .clone()
            .unwrap_or_else(|| DEFAULT_OTEL_SERVICE_NAME.to_string()),
        service_version: Some(VERSION),
        export_traces_stdout,
    })?;

    let result = tracing_util::global_tracer()
        .in_span_async(
            "app init",
            "App initialization",
            SpanVisibility::Internal,
            || Box::pin(start_engine(&server_options)),
        )
        .await;

    tracing_util::shutdown_tracer();
    if let Err(err) = &result {
        tracing::error!(error = %err, "error while starting up the engine");
    }
    Ok(result?)
}

async fn start_engine(server: &ServerOptions) -> Result<(), ServeError> {
    let state = build_state(&server.engine_config())?;

    let mut router = EngineRouter::new(state);
    if server.enable_cors {
        router.add_cors_layer(&server.cors_allow_origin());
    }

    let address = net::SocketAddr::new(server.host, server.port);
    tracing::info!(%address, "starting server");

    set_attribute_on_active_span(
        tracing_util::AttributeVisibility::Internal,
        "server_options",
        serde_json::to_string_pretty(server).unwrap_or_else(|err| err.to_string()),
    );

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum ServeError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("server failed: {0}")]
    Io(#[from] std::io::Error),
}

impl tracing_util::TraceableError for ServeError {
    fn visibility(&self) -> tracing_util::ErrorVisibility {
        match self {
            ServeError::Startup(_) => tracing_util::ErrorVisibility::User,
            ServeError::Io(_) => tracing_util::ErrorVisibility::Internal,
        }
    }
}

/// Resolves on Ctrl+C, or on SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutting down");
}
