use std::sync::Arc;

use authn_core::bearer_token_from_headers;
use federation::{SubgraphError, SubgraphRequest, SubgraphResponse, SubgraphService};
use rest_client::{RestApi, RestClient};
use rest_subgraph::RestSubgraph;

pub const LOCAL_SERVICE_NAME: &str = "rest";

/// The rest subgraph executed in-process.
///
/// Each request gets a REST client bound to the bearer token the gateway
/// forwarded in its `Authorization` header.
pub struct LocalRestService {
    subgraph: Arc<RestSubgraph>,
    client: RestClient,
}

impl LocalRestService {
    pub fn new(subgraph: Arc<RestSubgraph>, client: RestClient) -> Self {
        Self { subgraph, client }
    }
}

#[async_trait::async_trait]
impl SubgraphService for LocalRestService {
    fn name(&self) -> &str {
        LOCAL_SERVICE_NAME
    }

    async fn execute(&self, request: SubgraphRequest) -> Result<SubgraphResponse, SubgraphError> {
        let rest: Arc<dyn RestApi> =
            Arc::new(self.client.with_token(bearer_token_from_headers(&request.headers)));
        let mut graphql_request = async_graphql::Request::new(request.query).variables(
            async_graphql::Variables::from_json(serde_json::Value::Object(request.variables)),
        );
        if let Some(operation_name) = request.operation_name {
            graphql_request = graphql_request.operation_name(operation_name);
        }
        let response = self.subgraph.execute(graphql_request, rest).await;
        // the wire format is the contract between gateway and subgraph
        let body = serde_json::to_value(&response)?;
        Ok(serde_json::from_value(body)?)
    }
}
