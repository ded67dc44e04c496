use std::collections::HashMap;

use authn_core::BearerToken;
use cookie::Cookie;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use jsonwebtoken::{self as jwt, decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing_util::{ErrorVisibility, TraceableError};

/// Cookie names under which the session JWT is looked up, in order.
pub const DEFAULT_SESSION_COOKIE_NAMES: [&str; 2] =
    ["next-auth.session-token", "__Secure-next-auth.session-token"];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no session token found in the Cookie or Authorization headers")]
    TokenNotFound,
    #[error("Error in parsing the {header_name} header: {err}")]
    HeaderParseError { header_name: String, err: String },
    #[error("JWT validation error: {0}")]
    JWTValidationError(jwt::errors::Error),
    #[error("the session token does not carry an apiToken claim")]
    MissingApiToken,
    #[error("Internal Error - {0}")]
    Internal(#[from] InternalError),
}

impl TraceableError for Error {
    fn visibility(&self) -> ErrorVisibility {
        match self {
            Error::Internal(_) => ErrorVisibility::Internal,
            _ => ErrorVisibility::User,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    #[error("Error while decoding the JWT: {0}")]
    JWTDecodingError(jwt::errors::Error),
}

/// Secret and lookup configuration of the session JWT.
#[derive(Clone)]
pub struct JwtConfig {
    secret: DecodingKey,
    /// Seconds of clock skew tolerated when checking `exp`
    pub leeway: u64,
    pub cookie_names: Vec<String>,
}

impl JwtConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: DecodingKey::from_secret(secret.as_bytes()),
            leeway: 0,
            cookie_names: DEFAULT_SESSION_COOKIE_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("leeway", &self.leeway)
            .field("cookie_names", &self.cookie_names)
            .finish_non_exhaustive()
    }
}

/// The claims of the session JWT this gateway cares about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub api_token: Option<BearerToken>,
    pub sub: Option<String>,
    pub exp: u64,
}

/// Categorize `jsonwebtoken` errors: problems with the token the client sent
/// versus problems on our side.
#[allow(clippy::match_same_arms)]
fn categorize_jwt_error(jwt_error: jwt::errors::Error) -> Error {
    use jwt::errors::ErrorKind;

    match jwt_error.kind() {
        ErrorKind::ExpiredSignature
        | ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => Error::JWTValidationError(jwt_error),
        _ => Error::Internal(InternalError::JWTDecodingError(jwt_error)),
    }
}

pub(crate) fn decode_session_claims(
    config: &JwtConfig,
    token: &str,
) -> Result<SessionClaims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway;
    validation.validate_exp = true;
    let claims: SessionClaims = decode(token, &config.secret, &validation)
        .map_err(categorize_jwt_error)?
        .claims;
    Ok(claims)
}

/// Find the raw session JWT in the request headers.
///
/// Cookies are tried first, in the order of `cookie_names`. A cookie that was
/// too large for one `Set-Cookie` is split into `<name>.0`, `<name>.1`, … and
/// reassembled here. The `Authorization: Bearer` header is the fallback.
pub(crate) fn get_session_token(config: &JwtConfig, headers: &HeaderMap) -> Result<String, Error> {
    if let Some(token) = session_cookie(config, headers) {
        return Ok(token);
    }

    if let Some(authorization) = headers.get(AUTHORIZATION) {
        let authorization = authorization
            .to_str()
            .map_err(|e| Error::HeaderParseError {
                header_name: "Authorization".to_string(),
                err: e.to_string(),
            })?;
        return match authorization
            .split_whitespace()
            .collect::<Vec<&str>>()
            .as_slice()
        {
            ["Bearer", token] => Ok((*token).to_string()),
            _ => Err(Error::HeaderParseError {
                header_name: "Authorization".to_string(),
                err: "The `Authorization` header is expected to be in the format of `Bearer <JWT>`"
                    .to_string(),
            }),
        };
    }

    Err(Error::TokenNotFound)
}

/// The session token from the `Cookie` header, if any. A header that is not
/// visible ASCII is ignored.
fn session_cookie(config: &JwtConfig, headers: &HeaderMap) -> Option<String> {
    let cookie_header = match headers.get(COOKIE)?.to_str() {
        Ok(cookie_header) => cookie_header,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring unreadable Cookie header");
            return None;
        }
    };
    let cookies = parse_cookies(cookie_header);
    config
        .cookie_names
        .iter()
        .find_map(|name| read_cookie(&cookies, name))
}

/// Pairs that don't parse, such as valueless cookies, are skipped.
fn parse_cookies(cookie_header: &str) -> HashMap<String, String> {
    Cookie::split_parse(cookie_header)
        .filter_map(|cookie| {
            cookie
                .map_err(|err| tracing::trace!(error = %err, "skipping unparsable cookie"))
                .ok()
        })
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect()
}

fn read_cookie(cookies: &HashMap<String, String>, name: &str) -> Option<String> {
    if let Some(value) = cookies.get(name) {
        return Some(value.clone());
    }
    let chunks: Vec<&String> = (0..)
        .map_while(|index| cookies.get(&format!("{name}.{index}")))
        .collect();
    (!chunks.is_empty()).then(|| chunks.into_iter().map(String::as_str).collect())
}

/// Seconds since the epoch, for minting tokens in tests.
#[cfg(test)]
pub(crate) fn now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}
