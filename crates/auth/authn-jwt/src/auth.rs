use authn_core::Session;
use http::HeaderMap;
use tracing_util::SpanVisibility;

use crate::jwt::{decode_session_claims, get_session_token, Error, JwtConfig};

/// Authenticates the request from the session JWT found in its cookies or
/// `Authorization` header and returns the session carrying the user's API token.
pub async fn authenticate(jwt_config: &JwtConfig, headers: &HeaderMap) -> Result<Session, Error> {
    let tracer = tracing_util::global_tracer();
    tracer
        .in_span_async(
            "jwt_authenticate_request",
            "Authenticate request using the session token",
            SpanVisibility::Internal,
            || {
                Box::pin(async {
                    let token = get_session_token(jwt_config, headers)?;
                    let claims = decode_session_claims(jwt_config, &token)?;
                    let api_token = claims.api_token.ok_or(Error::MissingApiToken)?;
                    Ok::<_, Error>(Session::authenticated(api_token, claims.sub))
                })
            },
        )
        .await
}

/// Like [`authenticate`], but never fails: a request without a valid session
/// runs anonymously. The reason is logged and not returned to the client.
pub async fn session_or_anonymous(jwt_config: &JwtConfig, headers: &HeaderMap) -> Session {
    match authenticate(jwt_config, headers).await {
        Ok(session) => session,
        Err(Error::TokenNotFound) => Session::Anonymous,
        Err(err) => {
            tracing::info!(error = %err, "session token rejected, continuing anonymously");
            Session::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use authn_core::BearerToken;
    use http::header::{AUTHORIZATION, COOKIE};
    use http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::jwt::now;

    fn mint(claims: &serde_json::Value, secret: &str) -> anyhow::Result<String> {
        Ok(encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?)
    }

    #[tokio::test]
    async fn test_authenticate_from_session_cookie() -> anyhow::Result<()> {
        let token = mint(
            &json!({ "apiToken": "api-token", "sub": "user-1", "exp": now() + 600 }),
            "secret",
        )?;
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("next-auth.session-token={token}").parse()?,
        );

        let session = authenticate(&JwtConfig::new("secret"), &headers).await?;
        assert_eq!(
            session,
            Session::authenticated(BearerToken::new("api-token"), Some("user-1".to_string()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_from_chunked_cookie() -> anyhow::Result<()> {
        let token = mint(&json!({ "apiToken": "chunked", "exp": now() + 600 }), "secret")?;
        let (head, tail) = token.split_at(token.len() / 2);
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!(
                "__Secure-next-auth.session-token.0={head}; \
                 __Secure-next-auth.session-token.1={tail}"
            )
            .parse()?,
        );

        let session = authenticate(&JwtConfig::new("secret"), &headers).await?;
        assert_eq!(session.api_token(), Some(&BearerToken::new("chunked")));
        Ok(())
    }

    #[tokio::test]
    async fn test_authenticate_from_bearer_header() -> anyhow::Result<()> {
        let token = mint(&json!({ "apiToken": "bearer", "exp": now() + 600 }), "secret")?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);

        let session = authenticate(&JwtConfig::new("secret"), &headers).await?;
        assert_eq!(session.api_token(), Some(&BearerToken::new("bearer")));
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_cookies_keep_the_session() -> anyhow::Result<()> {
        let config = JwtConfig::new("secret");
        let token = mint(&json!({ "apiToken": "T", "exp": now() + 600 }), "secret")?;

        let mut cookie_session = HeaderMap::new();
        cookie_session.insert(
            COOKIE,
            format!("analytics; next-auth.session-token={token}").parse()?,
        );
        let mut bearer_session = HeaderMap::new();
        bearer_session.insert(COOKIE, HeaderValue::from_static("analytics"));
        bearer_session.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);

        for headers in [cookie_session, bearer_session] {
            let session = session_or_anonymous(&config, &headers).await;
            assert_eq!(session.api_token(), Some(&BearerToken::new("T")));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_sessions_are_anonymous() -> anyhow::Result<()> {
        let config = JwtConfig::new("secret");
        let expired = mint(&json!({ "apiToken": "a", "exp": now() - 600 }), "secret")?;
        let forged = mint(&json!({ "apiToken": "a", "exp": now() + 600 }), "not-the-secret")?;
        let without_api_token = mint(&json!({ "sub": "1", "exp": now() + 600 }), "secret")?;

        for token in [expired, forged, without_api_token, "garbage".to_string()] {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
            assert!(authenticate(&config, &headers).await.is_err());
            assert_eq!(session_or_anonymous(&config, &headers).await, Session::Anonymous);
        }

        assert_eq!(
            session_or_anonymous(&config, &HeaderMap::new()).await,
            Session::Anonymous
        );
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_or_anonymous(&config, &headers).await, Session::Anonymous);
        Ok(())
    }
}
