use std::sync::Arc;
use std::time::Duration;

use authn_core::BearerToken;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing_util::{SpanVisibility, Successful};

use crate::error::{RestError, RestResult};

const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the REST API client.
/// Contains everything needed to perform requests except the caller's token.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub base_path: Url,
    pub client: reqwest::Client,
    pub headers: HeaderMap<HeaderValue>,
}

impl Configuration {
    pub fn new(base_url: &str, timeout: Duration) -> RestResult<Self> {
        let base_path = Url::parse(base_url).map_err(|_| RestError::InvalidBaseUrl)?;
        if base_path.cannot_be_a_base() {
            return Err(RestError::InvalidBaseUrl);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));
        Ok(Self {
            base_path,
            client,
            headers,
        })
    }
}

/// Client for the REST API, bound to the bearer token of one caller.
#[derive(Debug, Clone)]
pub struct RestClient {
    configuration: Arc<Configuration>,
    token: Option<BearerToken>,
}

impl RestClient {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration: Arc::new(configuration),
            token: None,
        }
    }

    /// A client sharing this one's configuration that sends `token`.
    #[must_use]
    pub fn with_token(&self, token: Option<BearerToken>) -> Self {
        Self {
            configuration: self.configuration.clone(),
            token,
        }
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// Send a request to `path` (relative to the base URL) and decode the
    /// JSON:API document it returns. `204 No Content` and empty bodies decode
    /// to `null`.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &[&str],
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> RestResult {
        let url = append_path(&self.configuration.base_path, path)?;
        let request = self.construct_request(method, url, |builder| {
            let builder = if query.is_empty() {
                builder
            } else {
                builder.query(query)
            };
            match body {
                Some(body) => builder
                    .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE)
                    .body(body.to_string()),
                None => builder,
            }
        });
        execute_request(request).await
    }

    fn construct_request(
        &self,
        method: Method,
        url: Url,
        modify: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        let tracer = tracing_util::global_tracer();
        tracer
            .in_span(
                "construct_request",
                "Construct REST request",
                SpanVisibility::Internal,
                || {
                    let mut request_builder = self.configuration.client.request(method, url);
                    request_builder = modify(request_builder);
                    request_builder = request_builder.headers(self.configuration.headers.clone());
                    if let Some(token) = &self.token {
                        request_builder = request_builder.bearer_auth(token.as_str());
                    }
                    Successful::new(request_builder)
                },
            )
            .into_inner()
    }
}

/// Append path segments to a URL, tolerating a trailing slash on the base.
pub(crate) fn append_path(url: &Url, path: &[&str]) -> RestResult<Url> {
    let mut url = url.clone();
    url.path_segments_mut()
        .map_err(|()| RestError::InvalidBaseUrl)?
        .pop_if_empty()
        .extend(path);
    Ok(url)
}

async fn execute_request(request: reqwest::RequestBuilder) -> RestResult {
    let tracer = tracing_util::global_tracer();

    let response = tracer
        .in_span_async(
            "send_request",
            "Send REST request",
            SpanVisibility::Internal,
            || {
                Box::pin(async {
                    request
                        .headers(tracing_util::get_trace_headers())
                        .send()
                        .await
                        .map_err(RestError::from)
                })
            },
        )
        .await?;

    tracer
        .in_span_async(
            "deserialize_response",
            "Deserialize REST response",
            SpanVisibility::Internal,
            || {
                Box::pin(async {
                    let status = response.status();
                    let bytes = response.bytes().await?;
                    if status.is_client_error() || status.is_server_error() {
                        let body = String::from_utf8_lossy(&bytes).into_owned();
                        tracing::debug!(%status, "REST API request failed");
                        return Err(RestError::from_status(status, body));
                    }
                    if status == StatusCode::NO_CONTENT
                        || bytes.iter().all(u8::is_ascii_whitespace)
                    {
                        return Ok(Value::Null);
                    }
                    Ok::<_, RestError>(serde_json::from_slice(&bytes)?)
                })
            },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::append_path;
    use reqwest::Url;

    #[test]
    fn test_append_path() {
        let url = Url::parse("http://api.mpdx.org").unwrap();
        let result = append_path(&url, &["user", "google_accounts"]).unwrap();
        assert_eq!(result.as_str(), "http://api.mpdx.org/user/google_accounts");
    }

    #[test]
    fn test_append_path_with_trailing_slash() {
        let url = Url::parse("http://api.mpdx.org/api/v2/").unwrap();
        let result = append_path(&url, &["account_lists", "1"]).unwrap();
        assert_eq!(result.as_str(), "http://api.mpdx.org/api/v2/account_lists/1");
    }

    #[test]
    fn test_append_path_with_non_empty_path() {
        let url = Url::parse("http://api.mpdx.org/api/v2").unwrap();
        let result = append_path(&url, &["reports", "expected_monthly_totals"]).unwrap();
        assert_eq!(
            result.as_str(),
            "http://api.mpdx.org/api/v2/reports/expected_monthly_totals"
        );
    }

    #[test]
    fn test_append_path_escapes_segments() {
        let url = Url::parse("http://api.mpdx.org/").unwrap();
        let result = append_path(&url, &["appeals", "a/b"]).unwrap();
        assert_eq!(result.as_str(), "http://api.mpdx.org/appeals/a%2Fb");
    }
}
