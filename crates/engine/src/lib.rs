mod cors;
mod local;
mod middleware;
mod routes;
mod state;
mod types;

pub use cors::build_cors_layer;
pub use local::LocalRestService;
pub use middleware::{authentication_middleware, graphql_request_tracing_middleware};
pub use routes::EngineRouter;
pub use state::{build_state, EngineConfig};
pub use types::{EngineState, StartupError};

/// The version of the gateway, reported in traces.
pub static VERSION: &str = env!("CARGO_PKG_VERSION");
