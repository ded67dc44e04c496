use std::fmt;

use http::header::{InvalidHeaderValue, AUTHORIZATION};
use http::{HeaderMap, HeaderValue};

// The architecture is as follows:
// 1. The authn mechanism (session JWT) yields a `Session` for every request,
//    `Session::Anonymous` when no valid session could be found.
//
// 2. Before every subgraph fetch the session is turned back into an
//    `Authorization` header with `attach_authorization`.

/// The REST API token of the signed-in user. Never logged.
#[derive(Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

// The identity with which a request is executed
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Session {
    Authenticated {
        api_token: BearerToken,
        /// `sub` of the session token, for logs
        subject: Option<String>,
    },
    #[default]
    Anonymous,
}

impl Session {
    pub fn authenticated(api_token: BearerToken, subject: Option<String>) -> Self {
        Session::Authenticated { api_token, subject }
    }

    pub fn api_token(&self) -> Option<&BearerToken> {
        match self {
            Session::Authenticated { api_token, .. } => Some(api_token),
            Session::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

/// Outcome of injecting the session's token into outgoing request headers.
#[derive(Debug)]
pub enum AuthorizationHeader {
    Attached,
    /// No token in the session, the request goes out without credentials.
    Anonymous,
    /// The token could not be encoded as a header value. The request goes out
    /// without credentials.
    Failed(InvalidHeaderValue),
}

/// Set `Authorization: Bearer <token>` on `headers` if the session carries a
/// token. Any `Authorization` header already present is replaced, or removed
/// when the session is anonymous.
pub fn attach_authorization(headers: &mut HeaderMap, session: &Session) -> AuthorizationHeader {
    let Some(token) = session.api_token() else {
        headers.remove(AUTHORIZATION);
        return AuthorizationHeader::Anonymous;
    };
    match HeaderValue::from_str(&format!("Bearer {}", token.as_str())) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            AuthorizationHeader::Attached
        }
        Err(err) => {
            headers.remove(AUTHORIZATION);
            AuthorizationHeader::Failed(err)
        }
    }
}

/// Read the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token_from_headers(headers: &HeaderMap) -> Option<BearerToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    match value.split_whitespace().collect::<Vec<&str>>().as_slice() {
        ["Bearer", token] => Some(BearerToken::new(*token)),
        _ => {
            tracing::debug!("ignoring malformed Authorization header");
            None
        }
    }
}
