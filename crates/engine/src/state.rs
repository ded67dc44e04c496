use std::sync::Arc;
use std::time::Duration;

use authn_jwt::JwtConfig;
use cache_policy::CacheConfig;
use federation::{ExposeInternalErrors, Gateway, RemoteGraphqlService, ServiceList, SubgraphService};
use reqwest::Url;
use rest_client::{Configuration, RestClient};

use crate::local::{LocalRestService, LOCAL_SERVICE_NAME};
use crate::{EngineState, StartupError};

/// Name of the remote Rails GraphQL API, the owner of every root field not
/// claimed by the rest subgraph.
pub const API_SERVICE_NAME: &str = "api";

/// Path at which the rest subgraph is also served over HTTP.
pub const REST_SUBGRAPH_PATH: &str = "/api/graphql-rest";

/// Everything needed to build the engine state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_url: String,
    pub rest_api_url: String,
    pub site_url: String,
    pub jwt_secret: String,
    /// Seconds of clock skew tolerated on the session token's `exp`
    pub jwt_leeway: u64,
    pub upstream_timeout: Duration,
    /// Reach the rest subgraph through `SITE_URL` instead of in-process.
    pub rest_subgraph_over_http: bool,
    pub expose_internal_errors: ExposeInternalErrors,
}

fn parse_url(name: &'static str, url: &str) -> Result<Url, StartupError> {
    Url::parse(url).map_err(|_| StartupError::InvalidUrl {
        name,
        url: url.to_string(),
    })
}

/// Build the engine state: compose the rest subgraph and wire the services
/// of the gateway.
pub fn build_state(config: &EngineConfig) -> Result<EngineState, StartupError> {
    if config.jwt_secret.trim().is_empty() {
        return Err(StartupError::MissingJwtSecret);
    }
    let jwt_config = JwtConfig::new(&config.jwt_secret).with_leeway(config.jwt_leeway);

    let rest_client = RestClient::new(Configuration::new(
        &config.rest_api_url,
        config.upstream_timeout,
    )?);
    let rest_subgraph = Arc::new(rest_subgraph::build()?);

    let api = RemoteGraphqlService::new(
        API_SERVICE_NAME,
        parse_url("API_URL", &config.api_url)?,
        config.upstream_timeout,
    )?;
    let rest: Arc<dyn SubgraphService> = if config.rest_subgraph_over_http {
        let url = parse_url("SITE_URL", &config.site_url)?
            .join(REST_SUBGRAPH_PATH)
            .map_err(|_| StartupError::InvalidUrl {
                name: "SITE_URL",
                url: config.site_url.clone(),
            })?;
        Arc::new(RemoteGraphqlService::new(
            LOCAL_SERVICE_NAME,
            url,
            config.upstream_timeout,
        )?)
    } else {
        Arc::new(LocalRestService::new(
            rest_subgraph.clone(),
            rest_client.clone(),
        ))
    };

    let services = ServiceList::new(Arc::new(api)).with_service(
        rest,
        rest_subgraph.query_fields().iter().cloned(),
        rest_subgraph.mutation_fields().iter().cloned(),
    )?;
    tracing::info!(
        services = ?services.names().collect::<Vec<_>>(),
        "gateway services ready"
    );

    Ok(EngineState {
        gateway: Arc::new(Gateway::new(services, config.expose_internal_errors)),
        rest_subgraph,
        rest_client,
        jwt_config: Arc::new(jwt_config),
        cache_policy: Arc::new(CacheConfig::mpdx().to_json()),
    })
}
