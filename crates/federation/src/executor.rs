use authn_core::{attach_authorization, AuthorizationHeader, Session};
use http::HeaderMap;
use indexmap::IndexMap;
use serde_json::Value;
use tracing_util::SpanVisibility;

use crate::http::{ExposeInternalErrors, GraphQLError, PathSegment, RawRequest, Response};
use crate::plan::{plan, Fetch, QueryPlan, RootField};
use crate::service::{SubgraphError, SubgraphRequest, SubgraphResponse};
use crate::service_list::{RootKind, ServiceList};

/// Error code of the root fields whose subgraph request failed.
pub const SUBREQUEST_HTTP_ERROR: &str = "SUBREQUEST_HTTP_ERROR";

/// Executes client operations against the services of a `ServiceList`.
#[derive(Debug, Clone)]
pub struct Gateway {
    services: ServiceList,
    expose_internal_errors: ExposeInternalErrors,
}

impl Gateway {
    pub fn new(services: ServiceList, expose_internal_errors: ExposeInternalErrors) -> Self {
        Self {
            services,
            expose_internal_errors,
        }
    }

    pub fn services(&self) -> &ServiceList {
        &self.services
    }

    /// Plan `request`, fetch every part from its subgraph on behalf of
    /// `session` and merge the results.
    ///
    /// Request errors produce a response without data. A failing subgraph only
    /// nulls the root fields it owns.
    pub async fn execute(&self, request: RawRequest, session: &Session) -> Response {
        let tracer = tracing_util::global_tracer();
        let plan = match tracer.in_span("plan", "Plan the operation", SpanVisibility::User, || {
            plan(&self.services, &request)
        }) {
            Ok(plan) => plan,
            Err(err) => return Response::request_error(err.to_graphql_error()),
        };

        let results = match plan.kind {
            RootKind::Query => {
                futures_util::future::join_all(
                    plan.fetches.iter().map(|fetch| self.fetch(fetch, session)),
                )
                .await
            }
            RootKind::Mutation => {
                let mut results = Vec::with_capacity(plan.fetches.len());
                for fetch in &plan.fetches {
                    results.push(self.fetch(fetch, session).await);
                }
                results
            }
        };
        self.merge(&plan, results)
    }

    async fn fetch(
        &self,
        fetch: &Fetch,
        session: &Session,
    ) -> Result<SubgraphResponse, SubgraphError> {
        let service = self.services.service(fetch.service);
        let mut headers = HeaderMap::new();
        match attach_authorization(&mut headers, session) {
            AuthorizationHeader::Attached => {
                tracing::debug!(
                    service = service.name(),
                    "forwarding the api token of the session"
                );
            }
            AuthorizationHeader::Anonymous => {
                tracing::debug!(
                    service = service.name(),
                    "no session, sending an anonymous request"
                );
            }
            AuthorizationHeader::Failed(err) => {
                tracing::warn!(
                    service = service.name(),
                    error = %err,
                    "could not attach the authorization header, sending an anonymous request"
                );
            }
        }
        let request = SubgraphRequest {
            query: fetch.query.clone(),
            operation_name: fetch.operation_name.clone(),
            variables: fetch.variables.clone(),
            headers,
        };
        let tracer = tracing_util::global_tracer();
        tracer
            .in_span_async(
                "fetch",
                format!("Fetch from {}", service.name()),
                SpanVisibility::User,
                || Box::pin(async move { service.execute(request).await }),
            )
            .await
    }

    fn merge(
        &self,
        plan: &QueryPlan,
        results: Vec<Result<SubgraphResponse, SubgraphError>>,
    ) -> Response {
        let mut data: IndexMap<String, Value> = plan
            .root
            .iter()
            .map(|(key, field)| {
                let value = match field {
                    RootField::Typename => Value::String(plan.kind.to_string()),
                    RootField::Fetched(_) => Value::Null,
                };
                (key.clone(), value)
            })
            .collect();
        let mut errors = Vec::new();

        for (fetch, result) in plan.fetches.iter().zip(results) {
            let service_name = self.services.service(fetch.service).name();
            match result {
                Ok(response) => {
                    if let Some(mut fetched) = response.data {
                        for key in &fetch.response_keys {
                            if let Some(value) = fetched.remove(key) {
                                data.insert(key.clone(), value);
                            }
                        }
                    }
                    errors.extend(
                        response
                            .errors
                            .into_iter()
                            .map(|error| error.with_extension("serviceName", service_name)),
                    );
                }
                Err(err) => {
                    tracing::warn!(service = service_name, error = %err, "subgraph request failed");
                    for key in &fetch.response_keys {
                        data.insert(key.clone(), Value::Null);
                        errors.push(
                            GraphQLError::new(format!(
                                "HTTP fetch failed from '{service_name}': {err}"
                            ))
                            .with_path(vec![PathSegment::Field(key.clone())])
                            .with_extension("code", SUBREQUEST_HTTP_ERROR)
                            .with_extension("serviceName", service_name)
                            .internal(),
                        );
                    }
                }
            }
        }

        let errors = errors
            .into_iter()
            .map(|error| self.expose_internal_errors.censor(error))
            .collect();
        Response::partial(data, errors)
    }
}
