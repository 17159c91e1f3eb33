use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{jwt::TokenService, repo_types::User, services::Credentials};
use crate::error::ApiError;

/// Resolve the caller from the `Authorization: Bearer <token>` header.
///
/// Every failure (no header, wrong scheme, bad or expired token, subject no
/// longer registered) collapses into `ApiError::Unauthorized`; the reason
/// is only logged.
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
    credentials: &Credentials,
) -> Result<User, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| {
        warn!("missing or malformed Authorization header");
        ApiError::Unauthorized
    })?;

    let claims = tokens.verify(token).map_err(|e| {
        warn!(reason = %e, "token rejected");
        ApiError::Unauthorized
    })?;

    match credentials.find(&claims.sub).await? {
        Some(user) => Ok(user),
        None => {
            warn!("token subject is not a registered user");
            Err(ApiError::Unauthorized)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authenticated caller. Add it to a handler's arguments to protect it.
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
    Credentials: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let credentials = Credentials::from_ref(state);
        authenticate(&parts.headers, &tokens, &credentials)
            .await
            .map(CurrentUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{password::test_hasher, repo::MemoryUserStore};
    use axum::http::HeaderValue;
    use time::Duration as TimeDuration;

    fn setup() -> (TokenService, Credentials) {
        let tokens =
            TokenService::from_secret(b"gate-secret", TimeDuration::minutes(30)).unwrap();
        let credentials =
            Credentials::new(Arc::new(MemoryUserStore::new()), Arc::new(test_hasher()));
        (tokens, credentials)
    }

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_bearer_scheme() {
        assert_eq!(bearer_token(&with_auth("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&with_auth("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&with_auth("Basic abc")), None);
        assert_eq!(bearer_token(&with_auth("Bearer")), None);
        assert_eq!(bearer_token(&with_auth("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let (tokens, credentials) = setup();
        let user = credentials.register("a@x.com", "pw1").await.unwrap();
        let token = tokens.issue("a@x.com").unwrap();

        let resolved = authenticate(&with_auth(&format!("Bearer {token}")), &tokens, &credentials)
            .await
            .expect("authenticated");
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (tokens, credentials) = setup();
        let err = authenticate(&HeaderMap::new(), &tokens, &credentials)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn every_token_failure_is_the_same_error() {
        let (tokens, credentials) = setup();
        credentials.register("a@x.com", "pw1").await.unwrap();

        let expired = tokens
            .issue_with_ttl("a@x.com", TimeDuration::seconds(-5))
            .unwrap();
        let foreign = TokenService::from_secret(b"other", TimeDuration::minutes(30))
            .unwrap()
            .issue("a@x.com")
            .unwrap();
        let unknown_subject = tokens.issue("ghost@x.com").unwrap();

        for token in [expired, foreign, unknown_subject, "garbage".to_string()] {
            let err = authenticate(&with_auth(&format!("Bearer {token}")), &tokens, &credentials)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized), "token {token}");
        }
    }
}
