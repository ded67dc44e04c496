use std::sync::Arc;

use authn_jwt::JwtConfig;
use federation::{CompositionError, Gateway, SubgraphError};
use rest_client::{RestClient, RestError};
use rest_subgraph::{ComposeError, RestSubgraph};
use tracing_util::{ErrorVisibility, TraceableError};

#[derive(Clone)] // Cheap to clone as heavy fields are wrapped in `Arc`
pub struct EngineState {
    pub gateway: Arc<Gateway>,
    pub rest_subgraph: Arc<RestSubgraph>,
    /// Not bound to any token; requests bind their own.
    pub rest_client: RestClient,
    pub jwt_config: Arc<JwtConfig>,
    pub cache_policy: Arc<serde_json::Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("JWT_SECRET must be set to a non-empty value")]
    MissingJwtSecret,
    #[error("{name} is not a valid URL: {url}")]
    InvalidUrl { name: &'static str, url: String },
    #[error("could not build the REST client - {0}")]
    RestClient(#[from] RestError),
    #[error("could not build the subgraph client - {0}")]
    Subgraph(#[from] SubgraphError),
    #[error("could not compose the rest subgraph - {0}")]
    Compose(#[from] ComposeError),
    #[error("could not build the service list - {0}")]
    Composition(#[from] CompositionError),
}

impl TraceableError for StartupError {
    fn visibility(&self) -> ErrorVisibility {
        ErrorVisibility::User
    }
}
