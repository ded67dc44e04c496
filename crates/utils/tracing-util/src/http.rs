use crate::traceable::{ErrorVisibility, Traceable, TraceableError};

/// An HTTP response recorded on a span. Client and server error statuses mark
/// the span as failed.
pub struct TraceableHttpResponse<B> {
    pub response: http::Response<B>,
    pub path: &'static str,
}

impl<B> TraceableHttpResponse<B> {
    pub fn new(response: http::Response<B>, path: &'static str) -> Self {
        Self { response, path }
    }
}

#[derive(Debug, derive_more::Display)]
#[display("request to {path} failed with status {status}")]
pub struct HttpStatusError {
    path: &'static str,
    status: http::StatusCode,
}

impl TraceableError for HttpStatusError {
    fn visibility(&self) -> ErrorVisibility {
        ErrorVisibility::User
    }
}

impl<B> Traceable for TraceableHttpResponse<B> {
    type ErrorType<'a>
        = HttpStatusError
    where
        B: 'a;

    fn get_error(&self) -> Option<HttpStatusError> {
        let status = self.response.status();
        (status.is_client_error() || status.is_server_error()).then_some(HttpStatusError {
            path: self.path,
            status,
        })
    }
}
