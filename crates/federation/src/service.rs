use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing_util::{ErrorVisibility, SpanVisibility, TraceableError};

use crate::http::GraphQLError;

/// One GraphQL operation sent to a subgraph.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    pub variables: Map<String, Value>,
    /// Headers to send along, e.g. `Authorization`
    #[serde(skip)]
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SubgraphResponse {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubgraphError {
    #[error("request to subgraph failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("subgraph responded with status {status}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("unable to decode subgraph response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("subgraph failed: {0}")]
    Internal(String),
}

impl TraceableError for SubgraphError {
    fn visibility(&self) -> ErrorVisibility {
        ErrorVisibility::Internal
    }
}

/// A GraphQL service that owns some of the root fields of the gateway schema.
#[async_trait::async_trait]
pub trait SubgraphService: Send + Sync {
    /// Reported to clients as `extensions.serviceName` of the service's errors.
    fn name(&self) -> &str;

    async fn execute(&self, request: SubgraphRequest) -> Result<SubgraphResponse, SubgraphError>;
}

/// A subgraph reached over HTTP at `url`.
#[derive(Debug, Clone)]
pub struct RemoteGraphqlService {
    name: String,
    url: Url,
    client: reqwest::Client,
}

impl RemoteGraphqlService {
    pub fn new(
        name: impl Into<String>,
        url: Url,
        timeout: Duration,
    ) -> Result<Self, SubgraphError> {
        Ok(Self {
            name: name.into(),
            url,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl SubgraphService for RemoteGraphqlService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, request: SubgraphRequest) -> Result<SubgraphResponse, SubgraphError> {
        let tracer = tracing_util::global_tracer();
        let response = tracer
            .in_span_async(
                "send_subgraph_request",
                format!("Send request to subgraph {}", self.name),
                SpanVisibility::Internal,
                || {
                    Box::pin(async {
                        self.client
                            .post(self.url.clone())
                            .headers(request.headers.clone())
                            .headers(tracing_util::get_trace_headers())
                            .header(CONTENT_TYPE, "application/json")
                            .json(&request)
                            .send()
                            .await
                            .map_err(SubgraphError::from)
                    })
                },
            )
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(SubgraphError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
