use std::sync::{Arc, Mutex};
use std::time::Duration;

use authn_core::{BearerToken, Session};
use federation::{
    ExposeInternalErrors, Gateway, RawRequest, RemoteGraphqlService, ServiceList, SubgraphError,
    SubgraphRequest, SubgraphResponse, SubgraphService,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

type Calls = Arc<Mutex<Vec<(String, SubgraphRequest)>>>;

/// A subgraph answering every request with the same canned result.
struct FakeService {
    name: &'static str,
    response: Result<Value, u16>,
    calls: Calls,
}

#[async_trait::async_trait]
impl SubgraphService for FakeService {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, request: SubgraphRequest) -> Result<SubgraphResponse, SubgraphError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.name.to_string(), request));
        match &self.response {
            Ok(body) => Ok(serde_json::from_value(body.clone())?),
            Err(status) => Err(SubgraphError::Status {
                status: reqwest::StatusCode::from_u16(*status).unwrap(),
                body: String::new(),
            }),
        }
    }
}

fn gateway(
    api: Result<Value, u16>,
    rest: Result<Value, u16>,
    expose: ExposeInternalErrors,
) -> (Gateway, Calls) {
    let calls = Calls::default();
    let services = ServiceList::new(Arc::new(FakeService {
        name: "api",
        response: api,
        calls: calls.clone(),
    }))
    .with_service(
        Arc::new(FakeService {
            name: "rest",
            response: rest,
            calls: calls.clone(),
        }),
        ["googleAccounts", "mailchimpAccount"],
        ["deleteGoogleAccount"],
    )
    .unwrap();
    (Gateway::new(services, expose), calls)
}

fn request(query: &str) -> RawRequest {
    RawRequest {
        operation_name: None,
        query: query.to_string(),
        variables: None,
    }
}

fn session() -> Session {
    Session::authenticated(BearerToken::new("api-token"), Some("user-1".to_string()))
}

fn body(response: &federation::Response) -> Value {
    serde_json::to_value(&response.body).unwrap()
}

#[tokio::test]
async fn test_results_are_merged_in_selection_order() {
    let (gateway, calls) = gateway(
        Ok(json!({ "data": { "user": { "id": "u" }, "contacts": { "nodes": [] } } })),
        Ok(json!({ "data": { "googleAccounts": [{ "id": "g" }] } })),
        ExposeInternalErrors::Censor,
    );
    let response = gateway
        .execute(
            request("{ contacts { nodes { id } } googleAccounts { id } __typename user { id } }"),
            &session(),
        )
        .await;

    assert_eq!(response.status_code, http::StatusCode::OK);
    let body = body(&response);
    assert_eq!(
        body,
        json!({
            "data": {
                "contacts": { "nodes": [] },
                "googleAccounts": [{ "id": "g" }],
                "__typename": "Query",
                "user": { "id": "u" }
            }
        })
    );
    // keys keep the selection order rather than the order of the fetches
    let keys: Vec<_> = body["data"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["contacts", "googleAccounts", "__typename", "user"]);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    for (_, request) in calls.iter() {
        assert_eq!(request.headers["authorization"], "Bearer api-token");
    }
}

#[tokio::test]
async fn test_anonymous_sessions_send_no_authorization() {
    let (gateway, calls) = gateway(
        Ok(json!({ "data": { "user": null } })),
        Ok(json!({ "data": {} })),
        ExposeInternalErrors::Censor,
    );
    gateway
        .execute(request("{ user { id } }"), &Session::Anonymous)
        .await;
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_failed_subgraph_nulls_only_its_fields() {
    let (gateway, _) = gateway(
        Ok(json!({ "data": { "user": { "id": "u" } } })),
        Err(503),
        ExposeInternalErrors::Censor,
    );
    let response = gateway
        .execute(
            request(
                "{ user { id } googleAccounts { id } mail: mailchimpAccount(input: {}) { id } }",
            ),
            &session(),
        )
        .await;
    assert_eq!(
        body(&response),
        json!({
            "data": { "user": { "id": "u" }, "googleAccounts": null, "mail": null },
            "errors": [
                {
                    "message": "internal error",
                    "path": ["googleAccounts"],
                    "extensions": { "code": "SUBREQUEST_HTTP_ERROR", "serviceName": "rest" }
                },
                {
                    "message": "internal error",
                    "path": ["mail"],
                    "extensions": { "code": "SUBREQUEST_HTTP_ERROR", "serviceName": "rest" }
                }
            ]
        })
    );
}

#[tokio::test]
async fn test_exposed_fetch_errors_keep_their_message() {
    let (gateway, _) = gateway(Err(502), Ok(json!({ "data": {} })), ExposeInternalErrors::Expose);
    let response = gateway.execute(request("{ user { id } }"), &session()).await;
    let message = body(&response)["errors"][0]["message"].clone();
    assert_eq!(
        message,
        json!("HTTP fetch failed from 'api': subgraph responded with status 502 Bad Gateway")
    );
}

#[tokio::test]
async fn test_subgraph_errors_are_tagged_with_the_service() {
    let (gateway, _) = gateway(
        Ok(json!({
            "data": { "user": null },
            "errors": [{ "message": "not allowed", "path": ["user"] }]
        })),
        Ok(json!({ "data": {} })),
        ExposeInternalErrors::Censor,
    );
    let response = gateway.execute(request("{ user { id } }"), &session()).await;
    assert_eq!(
        body(&response),
        json!({
            "data": { "user": null },
            "errors": [{
                "message": "not allowed",
                "path": ["user"],
                "extensions": { "serviceName": "api" }
            }]
        })
    );
}

#[tokio::test]
async fn test_mutations_run_in_document_order() {
    let (gateway, calls) = gateway(
        Ok(json!({ "data": { "updateContact": { "id": "c" } } })),
        Ok(json!({ "data": { "deleteGoogleAccount": { "success": true } } })),
        ExposeInternalErrors::Censor,
    );
    let response = gateway
        .execute(
            request(
                "mutation { deleteGoogleAccount(input: {}) { success } \
                 updateContact(input: {}) { id } }",
            ),
            &session(),
        )
        .await;
    assert_eq!(
        body(&response)["data"],
        json!({ "deleteGoogleAccount": { "success": true }, "updateContact": { "id": "c" } })
    );
    let order: Vec<_> = calls.lock().unwrap().iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(order, vec!["rest", "api"]);
}

#[tokio::test]
async fn test_request_errors_have_no_data() {
    let (gateway, calls) = gateway(Ok(json!({})), Ok(json!({})), ExposeInternalErrors::Censor);
    let response = gateway
        .execute(request("subscription { ticks }"), &session())
        .await;
    assert_eq!(response.status_code, http::StatusCode::BAD_REQUEST);
    assert_eq!(
        body(&response),
        json!({
            "errors": [{
                "message": "subscriptions are not supported",
                "extensions": { "code": "GRAPHQL_VALIDATION_FAILED" }
            }]
        })
    );
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_service_over_http() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .match_header("authorization", "Bearer api-token")
        .with_status(200)
        .with_body(r#"{"data":{"user":{"id":"u"}}}"#)
        .create_async()
        .await;
    let url = reqwest::Url::parse(&format!("{}/graphql", server.url()))?;
    let services = ServiceList::new(Arc::new(RemoteGraphqlService::new(
        "api",
        url,
        Duration::from_secs(5),
    )?));
    let gateway = Gateway::new(services, ExposeInternalErrors::Censor);

    let response = gateway.execute(request("{ user { id } }"), &session()).await;
    mock.assert_async().await;
    assert_eq!(body(&response), json!({ "data": { "user": { "id": "u" } } }));
    Ok(())
}
