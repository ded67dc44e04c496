use reqwest::StatusCode;
use thiserror::Error;

pub type RestResult<T = serde_json::Value> = Result<T, RestError>;

/// Failure of a call to the REST backend.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("request to the REST API failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("resource not found")]
    NotFound,

    #[error("the REST API rejected the credentials with status {0}")]
    Unauthorized(StatusCode),

    #[error("the REST API responded with status {status}: {body}")]
    Backend { status: StatusCode, body: String },

    #[error("unable to decode JSON response from the REST API: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("invalid REST API base URL")]
    InvalidBaseUrl,
}

/// Coarse classification of a [`RestError`], exposed to GraphQL clients as
/// `extensions.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestErrorKind {
    Network,
    NotFound,
    Unauthorized,
    Backend,
    InvalidResponse,
}

impl RestErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            RestErrorKind::Network => "NETWORK_ERROR",
            RestErrorKind::NotFound => "NOT_FOUND",
            RestErrorKind::Unauthorized => "UNAUTHENTICATED",
            RestErrorKind::Backend => "UPSTREAM_ERROR",
            RestErrorKind::InvalidResponse => "INVALID_UPSTREAM_RESPONSE",
        }
    }
}

impl RestError {
    pub fn kind(&self) -> RestErrorKind {
        match self {
            RestError::Network(_) | RestError::InvalidBaseUrl => RestErrorKind::Network,
            RestError::NotFound => RestErrorKind::NotFound,
            RestError::Unauthorized(_) => RestErrorKind::Unauthorized,
            RestError::Backend { .. } => RestErrorKind::Backend,
            RestError::InvalidResponse(_) => RestErrorKind::InvalidResponse,
        }
    }

    /// Map an error status of the REST API to an error.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RestError::Unauthorized(status),
            StatusCode::NOT_FOUND => RestError::NotFound,
            status => RestError::Backend { status, body },
        }
    }
}

impl tracing_util::TraceableError for RestError {
    fn visibility(&self) -> tracing_util::ErrorVisibility {
        match self {
            RestError::NotFound | RestError::Unauthorized(_) => tracing_util::ErrorVisibility::User,
            _ => tracing_util::ErrorVisibility::Internal,
        }
    }
}
